mod emitter;
mod gate;
mod origin;
mod registry;
