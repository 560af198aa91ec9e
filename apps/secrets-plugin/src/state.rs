use std::sync::Arc;

use crate::driver::Driver;

#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<Driver>,
}

impl AppState {
    pub fn new(driver: Arc<Driver>) -> Self {
        Self { driver }
    }
}
