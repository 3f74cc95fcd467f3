pub mod commands;
mod controller;
mod debounce;
mod view;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::notes::NoteStore;

use controller::Controller;
use debounce::Debouncer;

pub use debounce::DEFAULT_SAVE_DEBOUNCE;

pub(crate) type SharedController = Arc<Mutex<Controller>>;

pub struct SessionState {
    controller: SharedController,
    pub(crate) saves: Debouncer,
}

impl SessionState {
    pub fn new(store: NoteStore, save_debounce: Duration) -> Self {
        Self {
            controller: Arc::new(Mutex::new(Controller::new(store))),
            saves: Debouncer::new(save_debounce),
        }
    }

    pub(crate) fn controller(&self) -> SharedController {
        Arc::clone(&self.controller)
    }
}
