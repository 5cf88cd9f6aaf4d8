use super::*;

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use anyhow::anyhow;
use serde_json::json;

fn counting_store(initial: AppState) -> (Store, Arc<AtomicUsize>) {
    let store = Store::new(initial);
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&renders);
    store.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (store, renders)
}

fn state(value: Value) -> AppState {
    AppState::from_value(value).expect("object state")
}

#[test]
fn synchronous_patches_merge_in_dispatch_order() {
    let (store, renders) = counting_store(state(json!({ "a": 0, "keep": "me" })));
    store.use_reactions(
        Reactions::new()
            .on("SetA", |cx| Ok(Some(Patch::new().with("a", cx.payload().clone()))))
            .on("SetB", |_| Ok(Some(Patch::new().with("b", true))))
            .on("Nothing", |_| Ok(None)),
    );

    store.dispatch("SetA", json!(1)).expect("SetA");
    store.dispatch("Nothing", Value::Null).expect("Nothing");
    store.dispatch("SetB", Value::Null).expect("SetB");
    store.dispatch("SetA", json!(3)).expect("SetA again");

    assert_eq!(
        store.get_state().to_value(),
        json!({ "a": 3, "keep": "me", "b": true })
    );
    assert_eq!(renders.load(Ordering::SeqCst), 3);
}

#[test]
fn empty_returned_patch_does_not_notify() {
    let (store, renders) = counting_store(AppState::initial());
    store.use_reactions(Reactions::new().on("Empty", |_| Ok(Some(Patch::new()))));

    store.dispatch("Empty", Value::Null).expect("dispatch");

    assert_eq!(renders.load(Ordering::SeqCst), 0);
    assert_eq!(store.get_state(), AppState::initial());
}

#[test]
fn unregistered_action_changes_nothing_and_does_not_notify() {
    let (store, renders) = counting_store(state(json!({ "a": 1, "nested": { "x": 1 } })));
    let before = store.get_state();

    store
        .dispatch("EnableWallet", json!({ "a": 2, "nested": null }))
        .expect("unknown action is not an error");

    assert_eq!(store.get_state(), before);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[test]
fn inventory_scenario_updates_tokens_then_bundles() {
    let (store, renders) = counting_store(AppState::initial());

    store
        .dispatch("update-inventory-tokens", json!(["t1", "t2"]))
        .expect("tokens");
    assert_eq!(
        store.get_state().to_value(),
        json!({ "inventory": { "bundles": [], "tokens": ["t1", "t2"] } })
    );

    store
        .dispatch("update-inventory-bundles", json!(["b1"]))
        .expect("bundles");
    assert_eq!(
        store.get_state().to_value(),
        json!({ "inventory": { "bundles": ["b1"], "tokens": ["t1", "t2"] } })
    );
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn registered_reaction_takes_precedence_over_core_reducer() {
    let store = Store::default();
    store.use_reactions(
        Reactions::new().on("update-inventory-tokens", |_| {
            Ok(Some(Patch::new().with("intercepted", true)))
        }),
    );

    store
        .dispatch("update-inventory-tokens", json!(["t1"]))
        .expect("dispatch");

    let state = store.get_state();
    assert_eq!(state.get("intercepted"), Some(&json!(true)));
    assert_eq!(
        state.get("inventory"),
        Some(&json!({ "bundles": [], "tokens": [] }))
    );
}

#[test]
fn later_use_reactions_call_overrides_handler() {
    let store = Store::default();
    store.use_reactions(Reactions::new().on("Pick", |_| Ok(Some(Patch::new().with("picked", 1)))));
    store.use_reactions(Reactions::new().on("Pick", |_| Ok(Some(Patch::new().with("picked", 2)))));

    store.dispatch("Pick", Value::Null).expect("dispatch");

    assert_eq!(store.get_state().get("picked"), Some(&json!(2)));
}

#[test]
fn failing_handler_propagates_and_merges_nothing() {
    let (store, renders) = counting_store(AppState::initial());
    store.use_reactions(Reactions::new().on("Broken", |_| Err(anyhow!("wallet exploded"))));

    let err = store.dispatch("Broken", Value::Null).expect_err("must fail");

    match err {
        StoreError::Reaction { action, source } => {
            assert_eq!(action, "Broken");
            assert_eq!(source.to_string(), "wallet exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.get_state(), AppState::initial());
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[test]
fn invalid_payload_surfaces_as_reaction_error() {
    let store = Store::default();
    store.use_reactions(Reactions::new().on("Typed", |cx| {
        let count: u32 = cx.payload_as()?;
        Ok(Some(Patch::new().with("count", count)))
    }));

    let err = store
        .dispatch("Typed", json!("not a number"))
        .expect_err("must fail");

    let StoreError::Reaction { source, .. } = err else {
        panic!("expected reaction error");
    };
    assert!(matches!(
        source.downcast_ref::<StoreError>(),
        Some(StoreError::InvalidPayload { action, .. }) if action == "Typed"
    ));
}

#[test]
fn deferring_without_a_runtime_is_reported() {
    let store = Store::default();
    store.use_reactions(Reactions::new().on("Later", |cx| {
        cx.defer(Duration::from_millis(10), |reactor| {
            reactor.update(Patch::new().with("late", true));
            Ok(())
        })?;
        Ok(None)
    }));

    let err = store.dispatch("Later", Value::Null).expect_err("no runtime");

    let StoreError::Reaction { source, .. } = err else {
        panic!("expected reaction error");
    };
    assert!(matches!(
        source.downcast_ref::<StoreError>(),
        Some(StoreError::NoRuntime { .. })
    ));
}

#[test]
fn nested_dispatch_is_visible_on_return_but_not_in_snapshot() {
    let store = Store::new(state(json!({ "b": 0 })));
    store.use_reactions(
        Reactions::new()
            .on("A", |cx| {
                cx.dispatch("B", json!(1))?;
                let seen_b = cx.current_state().get("b").cloned().unwrap_or(Value::Null);
                Ok(Some(Patch::new().with("a_saw_b", seen_b)))
            })
            .on("B", |cx| Ok(Some(Patch::new().with("b", cx.payload().clone())))),
    );

    store.dispatch("A", Value::Null).expect("dispatch");

    let state = store.get_state();
    assert_eq!(state.get("b"), Some(&json!(1)));
    assert_eq!(state.get("a_saw_b"), Some(&json!(0)));
}

#[test]
fn listener_reads_the_state_it_was_notified_about() {
    let store = Store::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let reader = store.clone();
    let sink = Arc::clone(&seen);
    store.subscribe(move || {
        let value = reader.get_state().get("step").cloned();
        sink.lock().expect("seen").push(value);
    });
    store.use_reactions(Reactions::new().on("Step", |cx| {
        Ok(Some(Patch::new().with("step", cx.payload().clone())))
    }));

    store.dispatch("Step", json!(1)).expect("1");
    store.dispatch("Step", json!(2)).expect("2");

    assert_eq!(
        *seen.lock().expect("seen"),
        vec![Some(json!(1)), Some(json!(2))]
    );
}

#[test]
fn context_round_trips_across_reactions() {
    #[derive(Debug, PartialEq)]
    struct Provider(&'static str);

    let store = Store::default();
    store.use_reactions(
        Reactions::new()
            .on("Set", |cx| {
                let name = if cx.payload() == &json!("y") { "y" } else { "x" };
                cx.context().set(Provider(name));
                Ok(None)
            })
            .on("Read", |cx| {
                let name = cx.context().get_as::<Provider>().map(|provider| provider.0);
                Ok(Some(Patch::new().with("provider", name)))
            }),
    );

    store.dispatch("Read", Value::Null).expect("read before set");
    assert_eq!(store.get_state().get("provider"), Some(&Value::Null));

    store.dispatch("Set", json!("x")).expect("set x");
    store.dispatch("Read", Value::Null).expect("read x");
    assert_eq!(store.get_state().get("provider"), Some(&json!("x")));

    store.dispatch("Set", json!("y")).expect("set y");
    store.dispatch("Read", Value::Null).expect("read y");
    assert_eq!(store.get_state().get("provider"), Some(&json!("y")));
    assert_eq!(*store.context().get_as::<Provider>().expect("y"), Provider("y"));
}

fn delayed_price(
    delay_ms: u64,
    label: &'static str,
) -> impl Fn(ReactionContext) -> anyhow::Result<Option<Patch>> + Send + Sync + 'static {
    move |cx| {
        cx.defer(Duration::from_millis(delay_ms), move |reactor| {
            reactor.update(Patch::new().with("price", label));
            Ok(())
        })?;
        Ok(None)
    }
}

#[tokio::test(start_paused = true)]
async fn deferred_updates_land_in_firing_order_not_dispatch_order() {
    let (store, renders) = counting_store(AppState::initial());
    store.use_reactions(
        Reactions::new()
            .on("Slow", delayed_price(600, "slow"))
            .on("Fast", delayed_price(350, "fast")),
    );

    store.dispatch("Slow", Value::Null).expect("slow");
    store.dispatch("Fast", Value::Null).expect("fast");
    assert_eq!(store.get_state().get("price"), None);
    assert_eq!(store.pending_tasks(), 2);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(store.get_state().get("price"), Some(&json!("fast")));

    store.settle().await.expect("settle");
    assert_eq!(store.get_state().get("price"), Some(&json!("slow")));
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(store.pending_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn nested_sync_merge_lands_before_outer_deferred_update() {
    let store = Store::default();
    store.use_reactions(
        Reactions::new()
            .on("A", |cx| {
                cx.defer(Duration::from_millis(100), |reactor| {
                    reactor.update(Patch::new().with("a_async", true));
                    Ok(())
                })?;
                cx.dispatch("B", json!("from A"))?;
                Ok(Some(Patch::new().with("a_sync", true)))
            })
            .on("B", |cx| Ok(Some(Patch::new().with("b", cx.payload().clone())))),
    );

    store.dispatch("A", Value::Null).expect("dispatch");

    let state = store.get_state();
    assert_eq!(state.get("b"), Some(&json!("from A")));
    assert_eq!(state.get("a_sync"), Some(&json!(true)));
    assert_eq!(state.get("a_async"), None);

    store.settle().await.expect("settle");
    assert_eq!(store.get_state().get("a_async"), Some(&json!(true)));
}

#[tokio::test(start_paused = true)]
async fn deferred_dispatch_chains_are_settled() {
    let store = Store::default();
    store.use_reactions(
        Reactions::new()
            .on("Load", |cx| {
                cx.defer(Duration::from_millis(600), |reactor| {
                    reactor.update(Patch::new().with("loaded", true));
                    reactor.dispatch("Derive", json!(2))?;
                    Ok(())
                })?;
                Ok(None)
            })
            .on("Derive", |cx| {
                let factor = cx.payload().as_i64().unwrap_or(1);
                cx.defer(Duration::from_millis(50), move |reactor| {
                    reactor.update(Patch::new().with("derived", factor * 10));
                    Ok(())
                })?;
                Ok(None)
            }),
    );

    store.dispatch("Load", Value::Null).expect("dispatch");
    store.settle().await.expect("settle");

    let state = store.get_state();
    assert_eq!(state.get("loaded"), Some(&json!(true)));
    assert_eq!(state.get("derived"), Some(&json!(20)));
}

#[tokio::test(start_paused = true)]
async fn failed_deferred_task_is_reported_without_touching_state() {
    let (store, renders) = counting_store(AppState::initial());
    store.use_reactions(Reactions::new().on("Flaky", |cx| {
        cx.defer(Duration::from_millis(10), |_| Err(anyhow!("provider offline")))?;
        Ok(None)
    }));

    store.dispatch("Flaky", Value::Null).expect("dispatch");
    let err = store.settle().await.expect_err("deferred failure");

    assert!(matches!(err, StoreError::Deferred { ref action, .. } if action == "Flaky"));
    assert_eq!(store.get_state(), AppState::initial());
    assert_eq!(renders.load(Ordering::SeqCst), 0);
    store.settle().await.expect("failure reported once");
}

fn explode() -> anyhow::Result<()> {
    panic!("deferred boom")
}

#[tokio::test(start_paused = true)]
async fn panicking_deferred_task_is_reported() {
    let store = Store::default();
    store.use_reactions(Reactions::new().on("Boom", |cx| {
        cx.spawn(async { explode() })?;
        Ok(None)
    }));

    store.dispatch("Boom", Value::Null).expect("dispatch");
    let err = store.settle().await.expect_err("panic");

    assert!(matches!(err, StoreError::TaskPanicked { ref action } if action == "Boom"));
}

#[tokio::test(start_paused = true)]
async fn deferred_updates_are_not_checked_for_staleness() {
    let store = Store::default();
    store.use_reactions(Reactions::new().on("Select", |cx| {
        let choice = cx.payload().clone();
        let delay = if choice == json!("first") { 500 } else { 100 };
        cx.defer(Duration::from_millis(delay), move |reactor| {
            reactor.update(Patch::new().with("selected", choice));
            Ok(())
        })?;
        Ok(None)
    }));

    store.dispatch("Select", json!("first")).expect("first");
    store.dispatch("Select", json!("second")).expect("second");
    store.settle().await.expect("settle");

    // The older request finishes last and overwrites the newer one.
    assert_eq!(store.get_state().get("selected"), Some(&json!("first")));
}
