mod init;
mod patch;
mod room_state;
