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

//! End to end tests of the configuration cache fed through in-memory diffs.

use confcache::{
    model::{AgentKind, Availability, InterfaceType, ItemState, TriggerValue},
    ConfigCache, ConfigCacheBuilder, DependencyCheck, DiffFeed, DiffRow, EntityKind, ItemResult, PollStatus,
    PollerType, Reschedule, TriggerDiff, VecDiff,
};

const NOW: i64 = 1000;

fn cache() -> ConfigCache {
    ConfigCacheBuilder::new().build().unwrap()
}

fn host(hostid: u64, name: &str) -> DiffRow {
    let mut columns = vec!["0", name, "0", "-1", "2", "", "", "0", "0", "0", "0"];
    for _ in 0..4 {
        columns.extend(["0", "0", "0", ""]);
    }
    columns.extend([name, "0", "0", "", "", "", "", ""]);
    DiffRow::add(hostid, columns)
}

fn item(itemid: u64, hostid: u64, key: &str, delay: &str) -> DiffRow {
    item_with(itemid, hostid, "0", key, delay, 0, &[])
}

/// An item row with a type, an interface and extra columns set by position.
fn item_with(
    itemid: u64,
    hostid: u64,
    item_type: &str,
    key: &str,
    delay: &str,
    interfaceid: u64,
    extra: &[(usize, &str)],
) -> DiffRow {
    let (hostid, interfaceid) = (hostid.to_string(), interfaceid.to_string());
    let mut columns = vec![
        hostid.as_str(),
        "0",
        item_type,
        "3",
        key,
        delay,
        "90d",
        "365d",
        interfaceid.as_str(),
        "",
        "0",
        "0",
        "0",
        "",
        "",
        "0",
        "",
        "0",
        "0",
    ];
    for &(idx, value) in extra {
        if columns.len() <= idx {
            columns.resize(idx + 1, "");
        }
        columns[idx] = value;
    }
    DiffRow::add(itemid, columns)
}

fn function(functionid: u64, itemid: u64, triggerid: u64, name: &str) -> DiffRow {
    let (itemid, triggerid) = (itemid.to_string(), triggerid.to_string());
    DiffRow::add(functionid, [itemid.as_str(), triggerid.as_str(), name, ""])
}

fn trigger(triggerid: u64, description: &str) -> DiffRow {
    let expression = format!("{{{triggerid}}}>0");
    DiffRow::add(
        triggerid,
        [description, expression.as_str(), "", "3", "0", "0", "0", "0", "0", "0", "", "0", ""],
    )
}

fn link(linkid: u64, from: u64, to: u64) -> DiffRow {
    let (from, to) = (from.to_string(), to.to_string());
    DiffRow::add(linkid, [from.as_str(), to.as_str()])
}

fn sync(cache: &ConfigCache, feed: Vec<(EntityKind, Vec<DiffRow>)>) {
    let mut diff = DiffFeed::new();
    for (kind, rows) in feed {
        diff.insert(kind, VecDiff::new(rows));
    }
    cache.sync(&mut diff, NOW).unwrap();
}

fn itemids(cache: &ConfigCache, poller_type: PollerType, now: i64) -> Vec<u64> {
    cache
        .get_poller_items(poller_type, now)
        .iter()
        .map(|item| item.itemid)
        .collect()
}

#[test_log::test]
fn test_sync_report() {
    let cache = cache();
    let mut feed = DiffFeed::new()
        .with(EntityKind::Hosts, VecDiff::new(vec![host(1, "web"), host(2, "db")]))
        .with(EntityKind::Items, VecDiff::new(vec![item(10, 1, "agent.ping", "60"), item(11, 9, "orphan", "60")]));
    let report = cache.sync(&mut feed, NOW).unwrap();

    assert_eq!(report.get(EntityKind::Hosts).add, 2);
    assert_eq!(report.get(EntityKind::Items).add, 1);
    assert_eq!(report.get(EntityKind::Items).skipped, 1);
    assert_eq!(report.total().add, 3);
    assert!(feed.is_empty());

    let json = serde_json::to_string(&report).unwrap();
    assert_eq!(serde_json::from_str::<confcache::SyncReport>(&json).unwrap(), report);
}

#[test_log::test]
fn test_host_removal_cascades() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::HostMacros, vec![DiffRow::add(1, ["1", "{$A}", "a"])]),
            (EntityKind::Hosts, vec![host(1, "web"), host(2, "db")]),
            (
                EntityKind::Interfaces,
                vec![DiffRow::add(5, ["1", "2", "1", "1", "1", "10.0.0.1", "", "161"])],
            ),
            (
                EntityKind::Items,
                vec![
                    item(10, 1, "agent.ping", "60"),
                    item(20, 2, "cpu", "60"),
                    item_with(30, 1, "17", "snmptrap.fallback", "0", 5, &[]),
                ],
            ),
            (EntityKind::Functions, vec![function(100, 10, 1000, "last")]),
            (EntityKind::Triggers, vec![trigger(1000, "web is down")]),
            (EntityKind::TriggerTags, vec![DiffRow::add(1, ["1000", "service", "web"])]),
        ],
    );
    {
        let store = cache.read();
        assert_eq!(store.get_item_count(None), 3);
        assert_eq!(store.expand_user_macros("{$A}", &[1]), "a");
        assert_eq!(
            store
                .get_snmp_interfaces_by_addr("10.0.0.1")
                .iter()
                .map(|i| i.interfaceid)
                .collect::<Vec<_>>(),
            vec![5]
        );
        assert_eq!(
            store.get_snmp_trap_items(5).iter().map(|i| i.itemid).collect::<Vec<_>>(),
            vec![30]
        );
        let triggers = store.get_triggers_by_triggerids(&[1000]);
        let tags = triggers[0].as_ref().map(|t| t.tags.clone());
        assert_eq!(tags, Some(vec![("service".to_string(), "web".to_string())]));
    }

    sync(&cache, vec![(EntityKind::Hosts, vec![DiffRow::remove(1)])]);

    let store = cache.read();
    assert!(store.get_host_by_name("web").is_none());
    assert!(store.get_host_by_name("db").is_some());
    let items = store.get_items_by_itemids(&[10, 20]);
    assert!(items[0].is_none());
    assert_eq!(items[1].as_ref().map(|item| item.key.as_str()), Some("cpu"));
    assert_eq!(store.get_triggers_by_triggerids(&[1000]), vec![None]);
    assert_eq!(store.get_functions_by_functionids(&[100]), vec![None]);
    assert_eq!(store.expand_user_macros("{$A}", &[1]), "{$A}");
    assert_eq!(store.get_item_count(None), 1);
    assert!(store.get_snmp_interfaces_by_addr("10.0.0.1").is_empty());
    assert!(store.get_snmp_trap_items(5).is_empty());
    assert!(store.get_interface_by_type(1, InterfaceType::Snmp).is_none());
    assert!(store.get_host_interfaces(1).is_empty());
    drop(store);
    assert!(cache.consistency_check().is_empty());
}

#[test]
fn test_lookup_by_keys() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (EntityKind::Items, vec![item(10, 1, "agent.ping", "60")]),
        ],
    );
    let found = cache
        .read()
        .get_items_by_keys(&[("web", "agent.ping"), ("web", "nope"), ("nope", "agent.ping")])
        .into_iter()
        .map(|item| item.map(|item| item.itemid))
        .collect::<Vec<_>>();
    assert_eq!(found, vec![Some(10), None, None]);
}

#[test]
fn test_macro_precedence() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::HostTemplates, vec![link(1, 3, 2)]),
            (
                EntityKind::GlobalMacros,
                vec![DiffRow::add(1, ["{$PORT}", "10050"]), DiffRow::add(2, ["{$G}", "global"])],
            ),
            (
                EntityKind::HostMacros,
                vec![
                    DiffRow::add(1, ["1", "{$PORT}", "20050"]),
                    DiffRow::add(2, ["2", "{$PORT}", "30050"]),
                    DiffRow::add(3, ["1", "{$PORT:\"db\"}", "5432"]),
                ],
            ),
        ],
    );

    let store = cache.read();
    assert_eq!(store.expand_user_macros("{$PORT}", &[1]), "20050");
    assert_eq!(store.expand_user_macros("{$PORT}", &[3]), "30050");
    assert_eq!(store.expand_user_macros("{$PORT}", &[4]), "10050");
    assert_eq!(store.expand_user_macros("port={$PORT:\"db\"}", &[1]), "port=5432");
    assert_eq!(store.expand_user_macros("{$PORT:other}", &[1]), "20050");
    assert_eq!(store.expand_user_macros("{$PORT:other}", &[4]), "10050");
    assert_eq!(store.expand_user_macros("{$G}/{$MISSING}", &[1]), "global/{$MISSING}");
    assert_eq!(store.expand_user_macros_with("{$PORT}", &[1], &|v| v.len() > 5), "{$PORT}");
}

#[test_log::test]
fn test_dependency_cycle() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (EntityKind::Items, vec![item(10, 1, "a", "60"), item(11, 1, "b", "60")]),
            (EntityKind::Functions, vec![function(100, 10, 1, "last"), function(101, 11, 2, "last")]),
            (EntityKind::Triggers, vec![trigger(1, "a"), trigger(2, "b")]),
            (EntityKind::TriggerDeps, vec![link(1, 1, 2), link(2, 2, 1)]),
        ],
    );

    assert_eq!(cache.read().check_trigger_dependencies(1, &[]), DependencyCheck::Pass);

    let deps = cache.read().get_trigger_dependencies(&[1, 2]);
    assert_eq!(deps.len(), 2);
    assert_eq!(deps[0].masters, vec![2]);
    // The walk through the batch leads back to trigger 1 itself.
    assert_eq!(deps[0].check, DependencyCheck::Unresolved(vec![1, 2]));

    cache.triggers_apply_changes(&[TriggerDiff {
        triggerid: 2,
        value: Some(TriggerValue::Problem),
        ..Default::default()
    }]);
    assert_eq!(cache.read().check_trigger_dependencies(1, &[]), DependencyCheck::Blocked);
}

#[test]
fn test_poller_queue_order() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (
                EntityKind::Items,
                vec![item(3, 1, "a", "60"), item(2, 1, "b", "60"), item(1, 1, "c", "60")],
            ),
        ],
    );

    assert_eq!(cache.read().poller_nextcheck(PollerType::Normal), Some(1021));
    assert!(itemids(&cache, PollerType::Normal, NOW).is_empty());

    let order = (0..4).map(|_| itemids(&cache, PollerType::Normal, 1100)).collect::<Vec<_>>();
    assert_eq!(order, vec![vec![1], vec![2], vec![3], vec![]]);

    let results = [1, 2, 3].map(|itemid| ItemResult {
        itemid,
        state: ItemState::Normal,
        lastclock: 1100,
        status: PollStatus::Succeed,
    });
    assert_eq!(cache.requeue_items(PollerType::Normal, &results), Some(1141));

    assert_eq!(cache.reschedule_items(&[3, 99], 1100), vec![Reschedule::Rescheduled, Reschedule::NotFound]);
    assert_eq!(itemids(&cache, PollerType::Normal, 1100), vec![3]);
}

#[test_log::test]
fn test_unreachable_host() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (EntityKind::Items, vec![item(1, 1, "agent.ping", "60")]),
        ],
    );
    assert_eq!(itemids(&cache, PollerType::Normal, 1100), vec![1]);

    let change = cache.deactivate_host(1, AgentKind::Agent, 1100, "connection refused").unwrap();
    assert_eq!((change.availability.errors_from, change.availability.disable_until), (1100, 1115));
    cache.requeue_items(PollerType::Normal, &[ItemResult {
        itemid: 1,
        state: ItemState::Normal,
        lastclock: 1100,
        status: PollStatus::NetworkError,
    }]);

    assert_eq!(cache.read().poller_nextcheck(PollerType::Normal), None);
    assert_eq!(cache.read().poller_nextcheck(PollerType::Unreachable), Some(1115));
    assert!(itemids(&cache, PollerType::Unreachable, 1114).is_empty());
    assert_eq!(itemids(&cache, PollerType::Unreachable, 1115), vec![1]);

    let diff = cache.hosts_availability_diff();
    assert_eq!(diff.len(), 1);
    assert_eq!((diff[0].hostid, diff[0].kind), (1, AgentKind::Agent));

    let change = cache.activate_host(1, AgentKind::Agent, 1120).unwrap();
    assert_eq!(change.availability.available, Availability::Available);
    assert_eq!(change.availability.errors_from, 0);
}

#[test]
fn test_timer_and_history_locks() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (EntityKind::Items, vec![item(10, 1, "agent.ping", "60")]),
            (
                EntityKind::Functions,
                vec![function(100, 10, 7, "nodata"), function(101, 10, 8, "last")],
            ),
            (EntityKind::Triggers, vec![trigger(7, "no data"), trigger(8, "value")]),
        ],
    );

    assert!(cache.get_timer_triggerids(1026, 10).is_empty());
    assert_eq!(cache.get_timer_triggerids(1027, 10), vec![7]);
    assert!(cache.lock_triggers_by_ids(&[7]).is_empty());

    let locks = cache.lock_triggers_by_history_items(&[10]);
    assert!(locks.triggerids.is_empty());
    assert_eq!(locks.busy_itemids, vec![10]);

    cache.reschedule_timer_triggers(&[7], 1027);
    cache.unlock_triggers(&[7]);
    assert!(cache.get_timer_triggerids(1086, 10).is_empty());

    let locks = cache.lock_triggers_by_history_items(&[10]);
    assert_eq!(locks.triggerids, vec![7, 8]);
    assert!(locks.busy_itemids.is_empty());
    cache.unlock_triggers(&locks.triggerids);

    assert_eq!(cache.get_timer_triggerids(1087, 10), vec![7]);
    cache.unlock_all_triggers();
    assert_eq!(cache.lock_triggers_by_ids(&[7, 8]), vec![7, 8]);
}

#[test]
fn test_dependent_item_type_change() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (
                EntityKind::Items,
                vec![
                    item(10, 1, "net.if.in", "60"),
                    item_with(11, 1, "18", "net.if.in.rate", "0", 0, &[(30, "10")]),
                ],
            ),
        ],
    );
    assert_eq!(cache.read().get_dependent_itemids(10), vec![11]);

    sync(&cache, vec![(EntityKind::Items, vec![item(11, 1, "net.if.in.rate", "60")])]);
    assert!(cache.read().get_dependent_itemids(10).is_empty());
    assert!(cache.consistency_check().is_empty());
}

#[test_log::test]
fn test_requeue_unreachable_items() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (EntityKind::Items, vec![item(1, 1, "agent.ping", "60")]),
        ],
    );
    assert_eq!(itemids(&cache, PollerType::Normal, 1100), vec![1]);
    cache.deactivate_host(1, AgentKind::Agent, 1100, "connection refused").unwrap();

    // The item was handed out but not polled: it moves to the unreachable cadence.
    cache.requeue_unreachable_items(&[1], 1100);
    assert_eq!(cache.read().poller_nextcheck(PollerType::Normal), None);
    assert_eq!(cache.read().poller_nextcheck(PollerType::Unreachable), Some(1115));

    // Items sitting in a queue are left alone.
    cache.requeue_unreachable_items(&[1], 1100);
    assert_eq!(cache.read().poller_nextcheck(PollerType::Unreachable), Some(1115));
    assert_eq!(itemids(&cache, PollerType::Unreachable, 1115), vec![1]);
}

#[test_log::test]
fn test_timeout_requeues_as_unreachable() {
    let cache = cache();
    sync(
        &cache,
        vec![
            (EntityKind::Hosts, vec![host(1, "web")]),
            (EntityKind::Items, vec![item(1, 1, "agent.ping", "60")]),
        ],
    );
    assert_eq!(itemids(&cache, PollerType::Normal, 1100), vec![1]);
    cache.deactivate_host(1, AgentKind::Agent, 1100, "timed out").unwrap();
    cache.requeue_items(PollerType::Normal, &[ItemResult {
        itemid: 1,
        state: ItemState::Normal,
        lastclock: 1100,
        status: PollStatus::TimeoutError,
    }]);

    assert_eq!(cache.read().poller_nextcheck(PollerType::Normal), None);
    assert_eq!(cache.read().poller_nextcheck(PollerType::Unreachable), Some(1115));
}
