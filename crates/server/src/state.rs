use ravel::worker::Worker;

pub struct AppState {
    pub worker: Worker,
}
