//! Connectivity flag driven by online/offline signals.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

#[derive(Debug)]
pub struct Connectivity {
    online: bool,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Applies a signal. Repeating the current state yields no transition.
    pub fn set_online(&mut self, online: bool) -> Option<Transition> {
        if self.online == online {
            return None;
        }
        self.online = online;
        tracing::info!(online, "connectivity changed");
        Some(if online {
            Transition::WentOnline
        } else {
            Transition::WentOffline
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_real_changes_are_transitions() {
        let mut link = Connectivity::new(true);

        assert_eq!(link.set_online(true), None);
        assert_eq!(link.set_online(false), Some(Transition::WentOffline));
        assert_eq!(link.set_online(false), None);
        assert_eq!(link.set_online(true), Some(Transition::WentOnline));
        assert!(link.is_online());
    }
}
