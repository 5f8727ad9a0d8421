//! Reactive state containers.
//!
//! Every container has exactly one writer, the [`Publisher`], and any number
//! of readers holding a [`StateHolder`]. Readers see the current value when
//! they start observing and every value published afterwards. A reader that
//! falls behind only sees the latest value.

use tokio::sync::watch;

use common::{AppError, AppResult, ErrorObject};
use domain::Identified;

/// Single writer of a state container
#[derive(Debug)]
pub struct Publisher<T> {
    tx: watch::Sender<T>,
}

impl<T> Publisher<T>
where
    T: Clone + Send + Sync,
{
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the current value
    pub fn next(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Modify the current value in place and publish it
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read-only handle for observers
    pub fn holder(&self) -> StateHolder<T> {
        StateHolder {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of a state container
#[derive(Debug, Clone)]
pub struct StateHolder<T> {
    rx: watch::Receiver<T>,
}

impl<T> StateHolder<T>
where
    T: Clone + Send + Sync,
{
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Start observing from the current value
    pub fn observe(&self) -> Observer<T> {
        Observer {
            rx: self.rx.clone(),
            primed: false,
        }
    }

    /// First value, current or future, satisfying `f`.
    ///
    /// `None` once the publisher is gone and the last value does not match.
    pub async fn wait_for(&self, f: impl FnMut(&T) -> bool) -> Option<T> {
        let mut rx = self.rx.clone();
        let value = rx.wait_for(f).await.ok()?;
        Some(value.clone())
    }
}

/// Stream of values from one container
#[derive(Debug)]
pub struct Observer<T> {
    rx: watch::Receiver<T>,
    primed: bool,
}

impl<T> Observer<T>
where
    T: Clone + Send + Sync,
{
    /// The current value on the first call, then each newly published value.
    /// `None` once the publisher has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Last full fetch combined with the most recently added or edited record
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedCache<T> {
    fetched: Vec<T>,
    edited: Option<T>,
}

impl<T> Default for DerivedCache<T> {
    fn default() -> Self {
        Self {
            fetched: Vec::new(),
            edited: None,
        }
    }
}

impl<T> DerivedCache<T>
where
    T: Identified + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a full fetch; it supersedes any pending edited record
    pub fn set_fetched(&mut self, records: Vec<T>) {
        self.fetched = records;
        self.edited = None;
    }

    /// Record an added or edited record.
    ///
    /// The previous pending record is folded into the fetched list first so
    /// consecutive edits are all kept.
    pub fn set_edited(&mut self, record: T) {
        if let Some(previous) = self.edited.take() {
            merge(&mut self.fetched, previous);
        }
        self.edited = Some(record);
    }

    pub fn edited(&self) -> Option<&T> {
        self.edited.as_ref()
    }

    /// Fetched records with the edited one replaced in place or appended
    pub fn output(&self) -> Vec<T> {
        let mut records = self.fetched.clone();
        if let Some(edited) = &self.edited {
            merge(&mut records, edited.clone());
        }
        records
    }
}

fn merge<T: Identified>(records: &mut Vec<T>, record: T) {
    match records.iter().position(|r| r.id() == record.id()) {
        Some(at) => records[at] = record,
        None => records.push(record),
    }
}

/// Records of one collection plus the last error of each kind of call.
///
/// Cancelled calls leave the slice untouched.
#[derive(Debug)]
pub struct CollectionSlice<T> {
    cache: Publisher<DerivedCache<T>>,
    fetch_error: Publisher<Option<ErrorObject>>,
    add_error: Publisher<Option<ErrorObject>>,
    edit_error: Publisher<Option<ErrorObject>>,
}

impl<T> Default for CollectionSlice<T>
where
    T: Identified + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollectionSlice<T>
where
    T: Identified + Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            cache: Publisher::new(DerivedCache::new()),
            fetch_error: Publisher::new(None),
            add_error: Publisher::new(None),
            edit_error: Publisher::new(None),
        }
    }

    /// Apply the result of a full fetch
    pub fn fetched(&self, result: &AppResult<Vec<T>>) {
        match result {
            Ok(records) => {
                self.cache.update(|c| c.set_fetched(records.clone()));
                self.fetch_error.next(None);
            }
            Err(AppError::Cancelled) => {}
            Err(e) => self.fetch_error.next(Some(e.to_object())),
        }
    }

    /// Apply the result of adding one record
    pub fn added(&self, result: &AppResult<T>) {
        Self::single(&self.cache, &self.add_error, result);
    }

    /// Apply the result of editing one record
    pub fn edited(&self, result: &AppResult<T>) {
        Self::single(&self.cache, &self.edit_error, result);
    }

    /// Record an error raised by an edit that returns no single record
    pub fn edit_failed(&self, error: ErrorObject) {
        self.edit_error.next(Some(error));
    }

    fn single(
        cache: &Publisher<DerivedCache<T>>,
        errors: &Publisher<Option<ErrorObject>>,
        result: &AppResult<T>,
    ) {
        match result {
            Ok(record) => {
                cache.update(|c| c.set_edited(record.clone()));
                errors.next(None);
            }
            Err(AppError::Cancelled) => {}
            Err(e) => errors.next(Some(e.to_object())),
        }
    }

    /// Current records as the derived cache outputs them
    pub fn records(&self) -> Vec<T> {
        self.cache.current().output()
    }

    pub fn cache(&self) -> StateHolder<DerivedCache<T>> {
        self.cache.holder()
    }

    pub fn fetch_error(&self) -> StateHolder<Option<ErrorObject>> {
        self.fetch_error.holder()
    }

    pub fn add_error(&self) -> StateHolder<Option<ErrorObject>> {
        self.add_error.holder()
    }

    pub fn edit_error(&self) -> StateHolder<Option<ErrorObject>> {
        self.edit_error.holder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        id: &'static str,
        value: u32,
    }

    impl Identified for Rec {
        fn id(&self) -> &str {
            self.id
        }
    }

    fn rec(id: &'static str, value: u32) -> Rec {
        Rec { id, value }
    }

    #[test]
    fn test_edited_record_replaced_in_place() {
        let mut cache = DerivedCache::new();
        cache.set_fetched(vec![rec("a", 1), rec("b", 2), rec("c", 3)]);
        cache.set_edited(rec("b", 20));

        assert_eq!(cache.output(), vec![rec("a", 1), rec("b", 20), rec("c", 3)]);
    }

    #[test]
    fn test_new_record_appended() {
        let mut cache = DerivedCache::new();
        cache.set_fetched(vec![rec("a", 1)]);
        cache.set_edited(rec("z", 9));

        assert_eq!(cache.output(), vec![rec("a", 1), rec("z", 9)]);
    }

    #[test]
    fn test_consecutive_edits_are_kept() {
        let mut cache = DerivedCache::new();
        cache.set_fetched(vec![rec("a", 1)]);
        cache.set_edited(rec("x", 1));
        cache.set_edited(rec("a", 5));

        assert_eq!(cache.output(), vec![rec("a", 5), rec("x", 1)]);
    }

    #[test]
    fn test_fetch_supersedes_edited() {
        let mut cache = DerivedCache::new();
        cache.set_edited(rec("x", 1));
        cache.set_fetched(vec![rec("a", 1)]);

        assert!(cache.edited().is_none());
        assert_eq!(cache.output(), vec![rec("a", 1)]);
    }

    #[tokio::test]
    async fn test_observer_gets_current_then_later_values() {
        let publisher = Publisher::new(1);
        let mut observer = publisher.holder().observe();

        assert_eq!(observer.next().await, Some(1));
        publisher.next(2);
        assert_eq!(observer.next().await, Some(2));

        drop(publisher);
        assert_eq!(observer.next().await, None);
    }

    #[tokio::test]
    async fn test_late_observer_sees_latest_value() {
        let publisher = Publisher::new("loading");
        publisher.next("ready");

        let mut observer = publisher.holder().observe();
        assert_eq!(observer.next().await, Some("ready"));
    }

    #[test]
    fn test_slice_routes_errors_per_call_kind() {
        let slice = CollectionSlice::new();
        slice.fetched(&Ok(vec![rec("a", 1)]));
        slice.added(&Err(AppError::duplicate_email()));

        assert_eq!(slice.records(), vec![rec("a", 1)]);
        assert!(slice.fetch_error().current().is_none());
        assert_eq!(
            slice.add_error().current().map(|e| e.name),
            Some("Duplicate Email".to_string())
        );

        slice.added(&Ok(rec("b", 2)));
        assert!(slice.add_error().current().is_none());
        assert_eq!(slice.records().len(), 2);
    }
}
