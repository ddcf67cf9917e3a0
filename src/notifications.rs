//! In-app notification list shown in the header popover.

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Unix seconds.
    pub created_at: i64,
    pub read: bool,
}

/// Bounded, newest-first notification store.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    next_id: u64,
    capacity: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `capacity` notifications, dropping the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            capacity: capacity.max(1),
        }
    }

    /// Adds an unread notification and returns its id.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.items.insert(
            0,
            Notification {
                id,
                kind,
                title: title.into(),
                body: body.into(),
                created_at: chrono::Utc::now().timestamp(),
                read: false,
            },
        );
        self.items.truncate(self.capacity);
        id
    }

    /// Notifications, newest first.
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.items {
            n.read = true;
        }
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_state() {
        let mut center = NotificationCenter::new();
        let first = center.push(NotificationKind::Info, "Loan due", "Copy c-4 is due today");
        let second = center.push(NotificationKind::Warning, "Overdue", "3 loans overdue");

        assert_eq!(center.items()[0].id, second);
        assert_eq!(center.unread_count(), 2);

        assert!(center.mark_read(first));
        assert!(!center.mark_read(999));
        assert_eq!(center.unread_count(), 1);

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut center = NotificationCenter::with_capacity(2);
        let first = center.push(NotificationKind::Info, "a", "");
        center.push(NotificationKind::Info, "b", "");
        center.push(NotificationKind::Info, "c", "");

        let titles: Vec<&str> = center.items().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b"]);
        assert!(!center.dismiss(first));
    }

    #[test]
    fn test_dismiss_and_clear() {
        let mut center = NotificationCenter::new();
        let id = center.push(NotificationKind::Success, "Saved", "");
        center.push(NotificationKind::Error, "Failed", "");

        assert!(center.dismiss(id));
        assert_eq!(center.items().len(), 1);

        center.clear();
        assert_eq!(center.unread_count(), 0);
    }
}
