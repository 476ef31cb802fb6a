use super::*;

/// Named processing-time timers for a single computation.
///
/// Each name holds at most one deadline: registering a name again replaces
/// its earlier deadline. Deadlines are kept sorted in a `BTreeMap` so due
/// timers can be found with a range scan.
#[derive(Debug, Clone, Default)]
pub struct TimerService {
    /// fire_at -> names due at that time.
    timers: BTreeMap<EventTime, BTreeSet<String>>,
    /// name -> its current deadline.
    deadlines: HashMap<String, EventTime>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `name` to fire at `fire_at`, replacing any earlier deadline for it.
    pub fn register(&mut self, name: impl Into<String>, fire_at: EventTime) {
        let name = name.into();
        if let Some(previous) = self.deadlines.insert(name.clone(), fire_at) {
            self.remove_entry(&name, previous);
        }
        self.timers.entry(fire_at).or_default().insert(name);
    }

    /// Cancel the timer called `name`. No-op if it is not armed.
    pub fn delete(&mut self, name: &str) {
        if let Some(fire_at) = self.deadlines.remove(name) {
            self.remove_entry(name, fire_at);
        }
    }

    /// Deadline currently armed for `name`.
    pub fn deadline(&self, name: &str) -> Option<EventTime> {
        self.deadlines.get(name).copied()
    }

    /// Drain and return all timers with `fire_at <= now`.
    ///
    /// The returned `(name, fire_at)` pairs are in ascending `fire_at` order,
    /// names with equal deadlines in lexical order.
    pub fn drain_due(&mut self, now: EventTime) -> Vec<(String, EventTime)> {
        let fire_times: Vec<EventTime> = self.timers.range(..=now).map(|(ts, _)| *ts).collect();

        let mut fired = Vec::new();
        for fire_at in fire_times {
            if let Some(names) = self.timers.remove(&fire_at) {
                for name in names {
                    self.deadlines.remove(&name);
                    fired.push((name, fire_at));
                }
            }
        }
        fired
    }

    /// Earliest pending deadline, or `None`.
    pub fn next_timer(&self) -> Option<EventTime> {
        self.timers.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    fn remove_entry(&mut self, name: &str, fire_at: EventTime) {
        if let Some(names) = self.timers.get_mut(&fire_at) {
            names.remove(name);
            if names.is_empty() {
                self.timers.remove(&fire_at);
            }
        }
    }
}
