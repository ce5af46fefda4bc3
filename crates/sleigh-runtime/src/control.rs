//! Observable range selection.
//!
//! A [`RangeControl`] holds a [`TimeRange`] and notifies subscribers
//! synchronously, in subscription order, whenever the value changes. The
//! observer list is snapshotted before notifying, so callbacks may set other
//! controls, subscribe or drop subscriptions without deadlocking.

use crate::{Error, Result};
use chrono::NaiveDateTime;
use sleigh_types::TimeRange;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Observer = Arc<dyn Fn(&TimeRange) + Send + Sync>;

/// Limits a control's value must stay inside. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeBounds {
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

impl RangeBounds {
    pub fn new(earliest: Option<NaiveDateTime>, latest: Option<NaiveDateTime>) -> Self {
        Self { earliest, latest }
    }

    pub fn check(&self, value: &TimeRange) -> Result<()> {
        if let Some(earliest) = self.earliest
            && value.start() < earliest
        {
            return Err(Error::OutOfBounds(format!(
                "{} starts before {}",
                value, earliest
            )));
        }
        if let Some(latest) = self.latest
            && value.end() > latest
        {
            return Err(Error::OutOfBounds(format!("{} ends after {}", value, latest)));
        }
        Ok(())
    }
}

struct ControlState {
    name: String,
    value: TimeRange,
    bounds: RangeBounds,
    observers: Vec<(u64, Observer)>,
    next_id: u64,
}

/// Shared, observable range value. Clones refer to the same control.
#[derive(Clone)]
pub struct RangeControl {
    state: Arc<Mutex<ControlState>>,
}

impl RangeControl {
    pub fn new(name: impl Into<String>, value: TimeRange) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControlState {
                name: name.into(),
                value,
                bounds: RangeBounds::default(),
                observers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn with_bounds(name: impl Into<String>, value: TimeRange, bounds: RangeBounds) -> Result<Self> {
        bounds.check(&value)?;
        let control = Self::new(name, value);
        control.lock().bounds = bounds;
        Ok(control)
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    pub fn value(&self) -> TimeRange {
        self.lock().value
    }

    pub fn bounds(&self) -> RangeBounds {
        self.lock().bounds
    }

    /// Set the value and notify observers.
    ///
    /// Returns `false` without notifying when the value is unchanged.
    pub fn set_value(&self, value: TimeRange) -> Result<bool> {
        let observers = {
            let mut state = self.lock();
            state.bounds.check(&value)?;
            if state.value == value {
                return Ok(false);
            }
            state.value = value;
            snapshot(&state)
        };
        for observer in observers {
            observer(&value);
        }
        Ok(true)
    }

    /// Replace bounds and value together, notifying if the value changed.
    pub fn reset(&self, bounds: RangeBounds, value: TimeRange) -> Result<bool> {
        bounds.check(&value)?;
        let observers = {
            let mut state = self.lock();
            state.bounds = bounds;
            if state.value == value {
                return Ok(false);
            }
            state.value = value;
            snapshot(&state)
        };
        for observer in observers {
            observer(&value);
        }
        Ok(true)
    }

    /// Register `observer`; it stays registered while the returned
    /// [`Subscription`] lives.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&TimeRange) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.observers.push((id, Arc::new(observer)));
        Subscription {
            state: Arc::downgrade(&self.state),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        // Observers run outside the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot(state: &ControlState) -> Vec<Observer> {
    state.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
}

impl fmt::Debug for RangeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("RangeControl")
            .field("name", &state.name)
            .field("value", &state.value)
            .field("bounds", &state.bounds)
            .field("observers", &state.observers.len())
            .finish()
    }
}

/// Keeps an observer registered; dropping it unsubscribes.
pub struct Subscription {
    state: Weak<Mutex<ControlState>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.observers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleigh_testing::fixtures::{range, timestamp};

    #[test]
    fn test_notifies_in_subscription_order() {
        let control = RangeControl::new("global", range("2024-05-08", "2024-05-10"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let seen = Arc::clone(&seen);
                control.subscribe(move |_| seen.lock().unwrap().push(i))
            })
            .collect();

        assert!(control.set_value(range("2024-05-09", "2024-05-10")).unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(subs.len(), 3);
    }

    #[test]
    fn test_unchanged_value_does_not_notify() {
        let value = range("2024-05-08", "2024-05-10");
        let control = RangeControl::new("global", value);
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let _sub = control.subscribe(move |_| *counter.lock().unwrap() += 1);

        assert!(!control.set_value(value).unwrap());
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let control = RangeControl::new("global", range("2024-05-08", "2024-05-10"));
        let sub = control.subscribe(|_| {});
        assert_eq!(control.observer_count(), 1);
        drop(sub);
        assert_eq!(control.observer_count(), 0);
    }

    #[test]
    fn test_bounds_reject_out_of_range_values() {
        let bounds = RangeBounds::new(Some(timestamp("2024-05-01")), None);
        let control =
            RangeControl::with_bounds("global", range("2024-05-08", "2024-05-10"), bounds).unwrap();
        let err = control
            .set_value(range("2024-04-30", "2024-05-02"))
            .unwrap_err();
        assert!(matches!(err, Error::OutOfBounds(_)));
        assert_eq!(control.value(), range("2024-05-08", "2024-05-10"));
    }

    #[test]
    fn test_observer_may_set_another_control() {
        let global = RangeControl::new("global", range("2024-05-08", "2024-05-10"));
        let local = RangeControl::new("local", range("2024-05-08", "2024-05-10"));
        let target = local.clone();
        let _link = global.subscribe(move |value| {
            target.set_value(*value).unwrap();
        });

        global.set_value(range("2024-05-01", "2024-05-03")).unwrap();
        assert_eq!(local.value(), range("2024-05-01", "2024-05-03"));
    }

    #[test]
    fn test_observer_may_resubscribe_during_notify() {
        let control = RangeControl::new("global", range("2024-05-08", "2024-05-10"));
        let handle = control.clone();
        let extra = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&extra);
        let _sub = control.subscribe(move |_| {
            sink.lock().unwrap().push(handle.subscribe(|_| {}));
        });

        control.set_value(range("2024-05-09", "2024-05-10")).unwrap();
        assert_eq!(control.observer_count(), 2);
    }
}
