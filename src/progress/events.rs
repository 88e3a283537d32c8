/// Published after a mutation has been applied and written through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    BookLoaded { title: String },
    ChapterChanged { index: usize },
    PageChanged { index: usize },
    PreferencesChanged,
    CacheUpdated,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&StoreEvent)>;

#[derive(Default)]
pub(super) struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub fn add(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn publish(&mut self, event: &StoreEvent) {
        for (_, callback) in self.entries.iter_mut() {
            callback(event);
        }
    }
}
