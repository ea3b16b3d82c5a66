#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<QuestApi>>,
}

impl AppState {
    fn new(api: QuestApi) -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(api)),
        }
    }
}
