// Copyright 2026 confcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::timer_nextcheck;
use crate::store::Store;

impl Store {
    /// Dequeue up to `limit` timer triggers due at `now` and lock them.
    ///
    /// Triggers already locked by another worker are dropped from the queue; they are requeued by whoever holds them.
    pub fn get_timer_triggerids(&mut self, now: i64, limit: usize) -> Vec<u64> {
        let mut triggerids = vec![];
        while triggerids.len() < limit {
            let Some((&triggerid, &nextcheck)) = self.queues.timers.peek() else {
                break;
            };
            if nextcheck > now {
                break;
            }
            self.queues.timers.pop();
            if let Some(trigger) = self.triggers.get_mut(triggerid).filter(|t| !t.locked) {
                trigger.locked = true;
                triggerids.push(triggerid);
            }
        }
        triggerids
    }

    /// Put processed timer triggers back into the timer queue.
    pub fn reschedule_timer_triggers(&mut self, triggerids: &[u64], now: i64) {
        if self.config.timers == 0 {
            return;
        }
        let delay = self.config.timer_delay;
        for &triggerid in triggerids {
            if self.triggers.get(triggerid).is_some_and(|t| t.timer && t.is_evaluated()) {
                self.queues.timers.insert(triggerid, timer_nextcheck(triggerid, now, delay));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confcache_memory::{arena::MIN_CAPACITY, Arena};

    use super::*;
    use crate::{config::CacheConfig, model::Trigger};

    #[test]
    fn test_timer_triggers() {
        let arena = Arc::new(Arena::new(MIN_CAPACITY * 8).unwrap());
        let config = CacheConfig {
            timer_delay: 30,
            ..Default::default()
        };
        let mut store = Store::new(config, arena);
        for triggerid in [1000000007, 1000000011] {
            store
                .triggers
                .find_or_create(triggerid, || Trigger {
                    triggerid,
                    timer: true,
                    functional: true,
                    ..Default::default()
                })
                .unwrap();
        }

        store.reschedule_timer_triggers(&[1000000007, 1000000011], 1000);
        assert_eq!(store.queues.timers.get(&1000000007), Some(&1007));
        assert_eq!(store.queues.timers.get(&1000000011), Some(&1011));

        assert!(store.get_timer_triggerids(1006, 10).is_empty());
        assert_eq!(store.get_timer_triggerids(1020, 10), vec![1000000007, 1000000011]);
        assert!(store.triggers.get(1000000007).unwrap().locked);

        // A locked trigger is not handed out twice.
        store.reschedule_timer_triggers(&[1000000007], 1020);
        assert!(store.get_timer_triggerids(1040, 10).is_empty());
        assert!(store.queues.timers.is_empty());
    }
}
