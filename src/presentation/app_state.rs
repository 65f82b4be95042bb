// Application state for HTTP handlers
use crate::application::refresh_controller::RefreshController;

#[derive(Clone)]
pub struct AppState {
    pub controller: RefreshController,
}
