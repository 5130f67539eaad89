// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{
    setup, FlagTrigger, PanickingAction, RecordingSink, TestContext, TEST_SOURCE,
};
use cadence_core::test_support::{FlagChecker, RecordingAction};
use cadence_core::{Condition, TriggerId};

struct Fixture {
    ctx: TestContext,
    set: TriggerSet,
    stage: Mutex<String>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            ctx: setup(),
            set: TriggerSet::new(),
            stage: Mutex::new(String::new()),
        }
    }

    /// Persist and add to the live set.
    fn add(&mut self, mut trigger: Trigger) -> TriggerId {
        let id = self.ctx.loader.insert(&mut trigger).unwrap();
        self.set.insert(trigger);
        id
    }

    async fn sweep(&mut self, sink: Option<&Arc<dyn MissedScheduleSink>>) -> ScanReport {
        let sweep = Sweep {
            loader: &self.ctx.loader,
            owned_source: TEST_SOURCE,
            missed_sink: sink,
            stage: &self.stage,
        };
        sweep.run(&mut self.set).await
    }

    fn status(&self, id: TriggerId) -> TriggerStatus {
        self.set.get(id).unwrap().status()
    }
}

#[tokio::test]
async fn unmet_trigger_waits() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build(TEST_SOURCE, true));

    let report = fx.sweep(None).await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.fired, 0);
    assert_eq!(fx.status(id), TriggerStatus::Ready);
    assert_eq!(flags.action.calls(), 0);
}

#[tokio::test]
async fn resettable_trigger_fires_and_rearms() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build(TEST_SOURCE, true));
    let before = fx.set.get(id).unwrap().next_check_time();
    flags.fire.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.fired, 1);
    assert_eq!(report.expired, 0);
    assert_eq!(flags.action.calls(), 1);
    assert_eq!(flags.fire.resets(), 1);
    assert_eq!(flags.end.resets(), 1);
    assert_eq!(fx.status(id), TriggerStatus::Ready);
    assert!(fx.set.get(id).unwrap().next_check_time() > before);

    // Rearmed: the flag was cleared by reset, so nothing fires again.
    let report = fx.sweep(None).await;
    assert_eq!(report.fired, 0);
    assert_eq!(flags.action.calls(), 1);
}

#[tokio::test]
async fn one_shot_trigger_expires_and_owned_one_is_removed() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build(TEST_SOURCE, false));
    flags.fire.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.fired, 1);
    assert_eq!(report.expired, 1);
    assert_eq!(report.removed, 1);
    assert!(!fx.set.contains(id));
    assert!(!fx.ctx.store.contains(id));
    assert!(flags.fire.is_stopped());
}

#[tokio::test]
async fn foreign_expired_trigger_is_left_for_its_owner() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build("someone-else", false));
    flags.fire.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.removed, 0);
    assert_eq!(fx.status(id), TriggerStatus::Expired);
    assert!(fx.ctx.store.contains(id));
    let stored = fx.ctx.loader.load(id).unwrap().unwrap();
    assert_eq!(stored.status(), TriggerStatus::Expired);

    // Expired triggers are not evaluated again.
    fx.sweep(None).await;
    assert_eq!(flags.action.calls(), 1);
}

#[tokio::test]
async fn end_time_expiry_pauses_before_firing() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build(TEST_SOURCE, true));
    flags.fire.set_value(true);
    flags.end.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.paused, 1);
    assert_eq!(report.fired, 0);
    assert_eq!(flags.expire_action.calls(), 1);
    assert_eq!(flags.action.calls(), 0);
    assert_eq!(fx.status(id), TriggerStatus::Paused);
    assert_eq!(
        fx.ctx.loader.load(id).unwrap().unwrap().status(),
        TriggerStatus::Paused
    );

    // Paused triggers stay put.
    fx.sweep(None).await;
    assert_eq!(flags.expire_action.calls(), 1);
    assert_eq!(flags.action.calls(), 0);
}

#[tokio::test]
async fn other_expire_shapes_do_not_pause() {
    let mut fx = Fixture::new();
    let fire = FlagChecker::new("fire", false, 0);
    let expire = FlagChecker::new("deadline", true, 0);
    let tc = Condition::new(vec![fire.boxed()], "fire.eval()").unwrap();
    let ec = Condition::new(vec![expire.boxed()], "deadline.eval()").unwrap();
    let id = fx.add(Trigger::builder(tc, ec).source(TEST_SOURCE).build());

    let report = fx.sweep(None).await;
    assert_eq!(report.paused, 0);
    assert_eq!(fx.status(id), TriggerStatus::Ready);
}

#[tokio::test]
async fn failing_action_does_not_stop_the_transition() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let failing = RecordingAction::failing("broken");
    let template = flags.build(TEST_SOURCE, false);
    let trigger = Trigger::builder(
        template.trigger_condition().clone(),
        template.expire_condition().clone(),
    )
    .source("elsewhere")
    .actions(vec![failing.shared(), flags.action.shared()])
    .reset_on_trigger(false)
    .build();
    let id = fx.add(trigger);
    flags.fire.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.failed, 0);
    assert_eq!(failing.calls(), 1);
    assert_eq!(flags.action.calls(), 1);
    assert_eq!(fx.status(id), TriggerStatus::Expired);
}

#[tokio::test]
async fn evaluation_error_is_contained_to_its_trigger() {
    let mut fx = Fixture::new();
    let broken = FlagTrigger::new();
    let healthy = FlagTrigger::new();
    let broken_id = fx.add(broken.build(TEST_SOURCE, true));
    let healthy_id = fx.add(healthy.build(TEST_SOURCE, true));
    broken.fire.set_failing(true);
    broken.fire.set_value(true);
    healthy.fire.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.checked, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.fired, 1);
    assert_eq!(healthy.action.calls(), 1);
    assert_eq!(broken.action.calls(), 0);
    assert!(fx.set.contains(broken_id));
    assert_eq!(fx.status(healthy_id), TriggerStatus::Ready);
}

#[tokio::test]
async fn panicking_action_is_contained_to_its_trigger() {
    let mut fx = Fixture::new();
    let broken = FlagTrigger::new();
    let healthy = FlagTrigger::new();
    // Due first, so it is visited before the healthy trigger.
    broken.fire.set_next_check_time(10);
    let template = broken.build(TEST_SOURCE, true);
    let panicking = Trigger::builder(
        template.trigger_condition().clone(),
        template.expire_condition().clone(),
    )
    .source(TEST_SOURCE)
    .action(Arc::new(PanickingAction))
    .build();
    let broken_id = fx.add(panicking);
    let healthy_id = fx.add(healthy.build(TEST_SOURCE, true));
    broken.fire.set_value(true);
    healthy.fire.set_value(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.checked, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.fired, 1);
    assert_eq!(healthy.action.calls(), 1);
    assert_eq!(fx.set.len(), 2);
    assert!(fx.set.contains(broken_id));
    assert_eq!(fx.status(healthy_id), TriggerStatus::Ready);
}

#[tokio::test]
async fn persistence_failure_is_reported_and_trigger_kept() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build(TEST_SOURCE, true));
    flags.fire.set_value(true);
    fx.ctx.store.set_unavailable(true);

    let report = fx.sweep(None).await;
    assert_eq!(report.failed, 1);
    assert_eq!(flags.action.calls(), 1);
    assert!(fx.set.contains(id));
}

#[tokio::test]
async fn missed_fire_times_go_to_the_sink() {
    let mut fx = Fixture::new();
    let flags = FlagTrigger::new();
    let id = fx.add(flags.build(TEST_SOURCE, true));
    flags.fire.push_missed(100);
    flags.fire.push_missed(200);
    flags.end.push_missed(999);

    let sink = Arc::new(RecordingSink::default());
    let dyn_sink: Arc<dyn MissedScheduleSink> = sink.clone();
    fx.sweep(Some(&dyn_sink)).await;
    assert_eq!(*sink.reports.lock(), vec![(id.0, vec![100, 200])]);

    fx.sweep(Some(&dyn_sink)).await;
    assert_eq!(sink.reports.lock().len(), 1);
}

#[tokio::test]
async fn stage_names_the_trigger_being_checked() {
    let mut fx = Fixture::new();
    let id = fx.add(FlagTrigger::new().build(TEST_SOURCE, true));
    fx.sweep(None).await;
    assert_eq!(*fx.stage.lock(), format!("Checking for trigger {id}"));
}
