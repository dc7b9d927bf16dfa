//! Multi-turn lifecycle tests.
//!
//! These drive `run_turn_in` through whole iterations with a scripted backend
//! and channel, applying hand-offs between turns the way the logging and fix
//! stages would.

use hunter::core::conversation::Role;
use hunter::core::types::{ADD_LOGS, IterationStatus, PROBLEM_IDENTIFIED};
use hunter::handoff::{Handoff, apply_handoff};
use hunter::hunter::{CONTINUE, NO, TurnOutcome, YES};
use hunter::report::{BugReport, report_bug};
use hunter::test_support::{ScriptedBackend, ScriptedChannel, TestProject};
use hunter::turn::run_turn_in;

fn report(repo: &TestProject) {
    report_bug(
        repo.path(),
        &BugReport {
            feedback: "Totals show NaN after removing an item".to_string(),
            run_command: Some("npm run dev".to_string()),
            ..BugReport::default()
        },
    )
    .expect("report");
}

/// Full lifecycle:
///
/// 1. Turn 1: derive reproduction steps, hunt → ADD_LOGS
/// 2. Logging stage hands back; turn 2 collects logs → HUNTING_FOR_BUG
/// 3. Turn 3: hunt with replayed evidence → PROBLEM_IDENTIFIED
/// 4. Fix stage hands back; turn 4: user says no and pastes logs
/// 5. Turn 5: hunt again; the new cycle inherits the fix flag
#[test]
fn iteration_runs_through_logging_and_fix_stages() {
    let repo = TestProject::new().expect("project");
    report(&repo);

    // Turn 1
    let backend = ScriptedBackend::new()
        .reply("1. Add two items\n2. Remove one\n3. Look at the total")
        .reply("Log the cart items before the total is computed")
        .conclude(ADD_LOGS);
    let channel = ScriptedChannel::new();
    let turn1 = run_turn_in(repo.path(), &backend, &channel).expect("turn 1");
    assert_eq!(
        turn1.outcome,
        TurnOutcome::Advanced {
            from: IterationStatus::HuntingForBug,
            to: IterationStatus::AwaitingLogging,
        }
    );
    backend.assert_drained();

    // Nothing happens until the logging stage reports back.
    let idle = run_turn_in(repo.path(), &ScriptedBackend::new(), &ScriptedChannel::new())
        .expect("idle turn");
    assert_eq!(
        idle.outcome,
        TurnOutcome::Idle {
            status: IterationStatus::AwaitingLogging
        }
    );
    apply_handoff(repo.path(), Handoff::LogsAdded).expect("logs added");

    // Turn 2
    let channel = ScriptedChannel::new()
        .paste(CONTINUE, "GET /cart 200\nPYTHAGORA_DEBUGGING_LOG: items=[{price:null}]")
        .paste(CONTINUE, "PYTHAGORA_DEBUGGING_LOG: total=NaN");
    run_turn_in(repo.path(), &ScriptedBackend::new(), &channel).expect("turn 2");
    channel.assert_drained();
    let session = repo.read_session().expect("session");
    assert_eq!(session.project.iteration.status, IterationStatus::HuntingForBug);
    let last = session.project.iteration.cycles.last().expect("cycle");
    assert_eq!(last.backend_logs, "items=[{price:null}]");
    assert_eq!(last.frontend_logs, "total=NaN");

    // Turn 3
    let backend = ScriptedBackend::new()
        .reply("Removed items keep a null price")
        .conclude(PROBLEM_IDENTIFIED);
    run_turn_in(repo.path(), &backend, &ScriptedChannel::new()).expect("turn 3");
    let hunting = &backend.requests()[0];
    let messages = hunting.conversation.messages();
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "Log the cart items before the total is computed");
    assert!(messages[3].content.contains("items=[{price:null}]"));
    assert!(messages[3].content.contains("total=NaN"));

    apply_handoff(repo.path(), Handoff::FixApplied).expect("fix applied");

    // Turn 4
    let channel = ScriptedChannel::new()
        .button(NO)
        .paste(CONTINUE, "PYTHAGORA_DEBUGGING_LOG: total=NaN")
        .button(CONTINUE);
    run_turn_in(repo.path(), &ScriptedBackend::new(), &channel).expect("turn 4");
    let session = repo.read_session().expect("session");
    let cycles = session.project.iteration.cycles.as_slice();
    assert_eq!(cycles.len(), 2);
    assert!(!cycles[0].fix_attempted);
    assert!(cycles[1].fix_attempted);

    // Turn 5
    let backend = ScriptedBackend::new()
        .reply("The total ignores the discount row")
        .conclude(ADD_LOGS);
    run_turn_in(repo.path(), &backend, &ScriptedChannel::new()).expect("turn 5");
    let hunting = &backend.requests()[0];
    assert!(
        hunting.conversation.messages()[5]
            .content
            .contains("A fix for the bug was attempted")
    );

    let session = repo.read_session().expect("session");
    assert_eq!(session.next_turn, 7);
    assert_eq!(session.iterations_revision, 3);
    let cycles = session.project.iteration.cycles.as_slice();
    assert_eq!(cycles.len(), 3);
    assert!(cycles[2].fix_attempted);
    assert_eq!(
        session.project.iteration.bug_reproduction_description.as_deref(),
        Some("1. Add two items\n2. Remove one\n3. Look at the total")
    );
}

/// The user confirms the fix, and a new bug can then be reported.
#[test]
fn confirmed_fix_completes_and_allows_new_report() {
    let repo = TestProject::new().expect("project");
    report(&repo);

    let backend = ScriptedBackend::new()
        .reply("Remove an item and watch the total")
        .reply("Removed items keep a null price")
        .conclude(PROBLEM_IDENTIFIED);
    run_turn_in(repo.path(), &backend, &ScriptedChannel::new()).expect("hunt");
    apply_handoff(repo.path(), Handoff::FixApplied).expect("fix applied");

    let channel = ScriptedChannel::new().button(YES);
    let done = run_turn_in(repo.path(), &ScriptedBackend::new(), &channel).expect("test");
    assert_eq!(
        done.outcome,
        TurnOutcome::Advanced {
            from: IterationStatus::AwaitingUserTest,
            to: IterationStatus::Complete,
        }
    );

    let session = report_bug(
        repo.path(),
        &BugReport {
            feedback: "Coupon field rejects valid codes".to_string(),
            ..BugReport::default()
        },
    )
    .expect("second report");
    assert_eq!(session.archived.len(), 1);
    assert_eq!(session.archived[0].status, IterationStatus::Complete);
    assert_eq!(session.project.run_command.as_deref(), Some("npm run dev"));
    assert_eq!(session.project.iteration.status, IterationStatus::HuntingForBug);
}
