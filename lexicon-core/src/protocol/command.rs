#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Readiness,
    SetInitializing,
    VocabularyCount,
    VocabularyList,
    VocabularyImport,
    CollectStart,
    CollectStatus,
    CollectItemsRequested,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "readiness" => Command::Readiness,
            "session.initializing" => Command::SetInitializing,
            "vocabulary.count" => Command::VocabularyCount,
            "vocabulary.list" => Command::VocabularyList,
            "vocabulary.import" => Command::VocabularyImport,
            "collect.start" => Command::CollectStart,
            "collect.status" => Command::CollectStatus,
            "collect.items_requested" => Command::CollectItemsRequested,
            _ => Command::Unknown,
        }
    }
}
