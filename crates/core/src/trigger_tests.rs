// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::test_support::{register_test_types, FlagChecker, RecordingAction};
use crate::time_checker::BasicTimeChecker;

fn flag_condition(id: &str, value: bool, next: i64) -> (FlagChecker, Condition) {
    let flag = FlagChecker::new(id, value, next);
    let condition = Condition::new(vec![flag.boxed()], &format!("{id}.eval()")).unwrap();
    (flag, condition)
}

fn sample_trigger() -> (FlagChecker, FlagChecker, Trigger) {
    let (fire, trigger_condition) = flag_condition("fire", false, 5_000);
    let (expire, expire_condition) = flag_condition("expire", false, 9_000);
    let trigger = Trigger::builder(trigger_condition, expire_condition)
        .id(TriggerId(7))
        .source("SimpleTimeTrigger")
        .submit_user("alice")
        .submit_time(1_000)
        .action(RecordingAction::new("run").shared())
        .reset_on_trigger(true)
        .reset_on_expire(false)
        .build();
    (fire, expire, trigger)
}

#[test]
fn builder_defaults() {
    let (_, trigger_condition) = flag_condition("a", false, 0);
    let (_, expire_condition) = flag_condition("b", false, 0);
    let trigger = Trigger::builder(trigger_condition, expire_condition).build();
    assert_eq!(trigger.id(), TriggerId::UNASSIGNED);
    assert!(!trigger.id().is_assigned());
    assert_eq!(trigger.status(), TriggerStatus::Ready);
    assert!(trigger.reset_on_trigger());
    assert!(trigger.reset_on_expire());
    assert!(!trigger.back_execute_once_on_miss());
    assert!(trigger.actions().is_empty());
}

#[test]
fn next_check_time_tracks_earliest_condition() {
    let (fire, expire, mut trigger) = sample_trigger();
    assert_eq!(trigger.next_check_time(), 5_000);

    expire.set_next_check_time(2_000);
    trigger.update_next_check_time();
    assert_eq!(trigger.next_check_time(), 2_000);

    fire.set_next_check_time(1_500);
    trigger.update_next_check_time();
    assert_eq!(trigger.next_check_time(), 1_500);
}

#[test]
fn condition_results_follow_checkers() {
    let (fire, expire, trigger) = sample_trigger();
    assert!(!trigger.trigger_condition_met().unwrap());
    fire.set_value(true);
    assert!(trigger.trigger_condition_met().unwrap());
    assert!(!trigger.expire_condition_met().unwrap());
    expire.set_value(true);
    assert!(trigger.expire_condition_met().unwrap());
}

#[test]
fn end_time_expiry_is_detected_by_checker_id() {
    let (_, _, trigger) = sample_trigger();
    assert!(!trigger.has_end_time_expiry());

    let clock = FakeClock::new();
    let end = BasicTimeChecker::end_time("EndTimeChecker_1", 0, 10_000, chrono_tz::UTC, clock.shared());
    let expire = Condition::new(vec![Box::new(end)], "EndTimeChecker_1.eval()").unwrap();
    let (_, fire) = flag_condition("fire", false, 0);
    let trigger = Trigger::builder(fire, expire).build();
    assert!(trigger.has_end_time_expiry());
}

#[test]
fn stop_checkers_reaches_both_conditions() {
    let (fire, expire, mut trigger) = sample_trigger();
    trigger.stop_checkers();
    assert!(fire.is_stopped());
    assert!(expire.is_stopped());
}

#[test]
fn missed_times_come_from_trigger_condition_only() {
    let (fire, expire, mut trigger) = sample_trigger();
    fire.push_missed(100);
    expire.push_missed(200);
    assert_eq!(trigger.take_missed_check_times(), vec![100]);
}

#[test]
fn json_round_trip_through_registries() {
    let registries = Registries::new();
    register_test_types(&registries);
    let (fire, _, mut trigger) = sample_trigger();
    fire.set_value(true);
    trigger.set_status(TriggerStatus::Paused);
    trigger.set_last_modify_time(4_000);

    let json = trigger.to_json().unwrap();
    assert_eq!(json["triggerId"], 7);
    assert_eq!(json["status"], "PAUSED");
    assert_eq!(json["submitUser"], "alice");
    assert_eq!(json["actions"][0]["type"], "RecordingAction");
    assert_eq!(json["resetOnExpire"], false);

    let back = Trigger::from_json(&json, &registries).unwrap();
    assert_eq!(back.id(), TriggerId(7));
    assert_eq!(back.status(), TriggerStatus::Paused);
    assert_eq!(back.source(), "SimpleTimeTrigger");
    assert_eq!(back.submit_time(), 1_000);
    assert_eq!(back.last_modify_time(), 4_000);
    assert_eq!(back.next_check_time(), 5_000);
    assert!(back.trigger_condition_met().unwrap());
    assert!(!back.reset_on_expire());
    assert_eq!(back.actions().len(), 1);
    assert!(back.find_action::<RecordingAction>().is_some());
}

#[test]
fn unknown_action_type_fails_decoding() {
    let registries = Registries::new();
    register_test_types(&registries);
    let (_, _, trigger) = sample_trigger();
    let mut json = trigger.to_json().unwrap();
    json["actions"][0]["type"] = "LaunchRockets".into();

    let err = Trigger::from_json(&json, &registries).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Registry(RegistryError::Unsupported { kind: "action", .. })
    ));
}

#[test]
fn description_names_actions_and_expression() {
    let (_, _, trigger) = sample_trigger();
    let text = trigger.description();
    assert!(text.contains("trigger 7 from SimpleTimeTrigger by alice"));
    assert!(text.contains("[record run]"));
    assert!(text.contains("when fire.eval()"));
}

#[yare::parameterized(
    ready   = { TriggerStatus::Ready,   "\"READY\"" },
    paused  = { TriggerStatus::Paused,  "\"PAUSED\"" },
    expired = { TriggerStatus::Expired, "\"EXPIRED\"" },
)]
fn status_serializes_upper_case(status: TriggerStatus, expected: &str) {
    assert_eq!(serde_json::to_string(&status).unwrap(), expected);
    assert_eq!(status.to_string(), expected.trim_matches('"'));
}
