//! Integration tests for pipe-mode execution against a real `/bin/sh`.

#![cfg(unix)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusty_shell::{
    ExecutorState, ShellConfig, ShellDelegate, ShellExecutor, TransportKind, CANCELLED_STATUS,
    FAILED_STATUS,
};

fn sh_executor() -> ShellExecutor {
    ShellExecutor::with_config(TransportKind::Pipe, ShellConfig::with_shell("/bin/sh"))
}

/// Collects every delegate callback for later inspection.
#[derive(Default)]
struct Recorder {
    output: Mutex<Vec<u8>>,
    error: Mutex<Vec<u8>>,
    strings: Mutex<Vec<String>>,
}

impl ShellDelegate for Recorder {
    fn log_output_data(&self, data: &[u8]) {
        self.output.lock().unwrap().extend_from_slice(data);
    }
    fn log_output_string(&self, text: &str) {
        self.strings.lock().unwrap().push(text.to_string());
    }
    fn log_error_data(&self, data: &[u8]) {
        self.error.lock().unwrap().extend_from_slice(data);
    }
}

#[test]
fn test_echo_hello() {
    rusty_shell::utils::init_logging();
    let executor = sh_executor();
    let status = executor.execute_command("echo hello");
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "hello\n");
    assert_eq!(executor.error_string(), "");
    assert_eq!(executor.state(), ExecutorState::Completed);
}

#[test]
fn test_exit_codes_are_returned_exactly() {
    let executor = sh_executor();
    for code in [0, 1, 7, 42, 255] {
        let status = executor.execute_command(&format!("exit {code}"));
        assert_eq!(status, code);
        assert_eq!(executor.output_string(), "");
    }
}

#[test]
fn test_termination_status_matches_return_value() {
    let executor = sh_executor();
    let status = executor.execute_command("exit 7");
    assert_eq!(status, 7);
    assert_eq!(executor.termination_status(), 7);
}

#[test]
fn test_stderr_is_captured_separately() {
    let executor = sh_executor();
    let status = executor.execute_command("echo to-out; echo to-err 1>&2");
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "to-out\n");
    assert_eq!(executor.error_string(), "to-err\n");
}

#[test]
fn test_output_is_byte_exact_and_ordered() {
    let executor = sh_executor();
    let status =
        executor.execute_command("i=0; while [ $i -lt 500 ]; do echo $i; i=$((i+1)); done");
    assert_eq!(status, 0);

    let expected: String = (0..500).map(|i| format!("{i}\n")).collect();
    assert_eq!(executor.output_string(), expected);
}

#[test]
fn test_working_directory_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().canonicalize().unwrap();

    let executor = sh_executor();
    let status = executor.execute_command_in("pwd", &path);
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), format!("{}\n", path.display()));
}

#[test]
fn test_environment_overlay_reaches_the_child() {
    let mut env = HashMap::new();
    env.insert("RUSTY_SHELL_MARKER".to_string(), "overlay-value".to_string());

    let executor = sh_executor();
    let status = executor.execute_command_with_env("echo $RUSTY_SHELL_MARKER", None, &env);
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "overlay-value\n");
}

#[test]
fn test_config_environment_reaches_the_child() {
    let mut config = ShellConfig::with_shell("/bin/sh");
    config
        .environment
        .insert("RUSTY_SHELL_CFG".to_string(), "from-config".to_string());

    let executor = ShellExecutor::with_config(TransportKind::Pipe, config);
    let status = executor.execute_command("echo $RUSTY_SHELL_CFG");
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "from-config\n");
}

#[test]
fn test_delegate_receives_streaming_chunks() {
    let recorder = Arc::new(Recorder::default());
    let executor = ShellExecutor::with_config(
        TransportKind::Pipe,
        ShellConfig::with_shell("/bin/sh"),
    )
    .with_delegate(recorder.clone());

    let status = executor.execute_command("echo one; echo two 1>&2; echo three");
    assert_eq!(status, 0);

    // The concatenation of streamed chunks equals the final buffers.
    assert_eq!(*recorder.output.lock().unwrap(), executor.output_data());
    assert_eq!(*recorder.error.lock().unwrap(), executor.error_data());
    assert_eq!(
        recorder.strings.lock().unwrap().concat(),
        executor.output_string()
    );
}

#[test]
fn test_empty_command_is_rejected_without_callbacks() {
    let recorder = Arc::new(Recorder::default());
    let executor = ShellExecutor::with_config(
        TransportKind::Pipe,
        ShellConfig::with_shell("/bin/sh"),
    )
    .with_delegate(recorder.clone());

    assert_eq!(executor.execute_command("   "), FAILED_STATUS);
    assert_eq!(executor.state(), ExecutorState::Failed);
    assert!(recorder.output.lock().unwrap().is_empty());
    assert!(recorder.error.lock().unwrap().is_empty());
}

#[test]
fn test_cancel_interrupts_a_sleeping_child() {
    let executor = Arc::new(sh_executor());

    let canceller = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        canceller.cancel();
    });

    let started = Instant::now();
    let status = executor.execute_command("sleep 10");
    let elapsed = started.elapsed();

    handle.join().unwrap();
    assert_eq!(status, CANCELLED_STATUS);
    assert_eq!(executor.state(), ExecutorState::Cancelled);
    assert!(elapsed < Duration::from_secs(5), "cancel took {elapsed:?}");
}

#[test]
fn test_cancel_bounded_with_forked_descendants() {
    let executor = Arc::new(sh_executor());

    let canceller = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        canceller.cancel();
    });

    // The shell forks `sleep` instead of exec-ing it, so the kill has to
    // reach the whole process group or the pipe stays open for 5s.
    let started = Instant::now();
    let status = executor.execute_command("sleep 5; echo after");
    let elapsed = started.elapsed();

    handle.join().unwrap();
    assert_eq!(status, CANCELLED_STATUS);
    assert_eq!(executor.state(), ExecutorState::Cancelled);
    assert!(elapsed < Duration::from_secs(2), "cancel took {elapsed:?}");
    assert!(!executor.output_string().contains("after"));
}

#[test]
fn test_cancel_is_idempotent() {
    let executor = Arc::new(sh_executor());

    let canceller = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        canceller.cancel();
        canceller.cancel();
    });

    let status = executor.execute_command("sleep 10");
    handle.join().unwrap();
    assert_eq!(status, CANCELLED_STATUS);

    // Cancelling after the session ended is also a no-op.
    executor.cancel();
    assert_eq!(executor.state(), ExecutorState::Cancelled);
}

#[test]
fn test_partial_output_survives_cancellation() {
    let executor = Arc::new(sh_executor());

    let canceller = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(500));
        canceller.cancel();
    });

    let status = executor.execute_command("echo before-sleep; sleep 10; echo after-sleep");
    handle.join().unwrap();

    assert_eq!(status, CANCELLED_STATUS);
    assert_eq!(executor.output_string(), "before-sleep\n");
}

#[test]
fn test_executor_is_reusable_after_each_state() {
    let executor = sh_executor();

    assert_eq!(executor.execute_command(""), FAILED_STATUS);
    assert_eq!(executor.execute_command("echo again"), 0);
    assert_eq!(executor.output_string(), "again\n");
    assert_eq!(executor.state(), ExecutorState::Completed);
}

#[test]
fn test_overlapping_execute_is_rejected() {
    let executor = Arc::new(sh_executor());

    let second = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        second.execute_command("echo overlap")
    });

    let status = executor.execute_command("sleep 1");
    let overlapped = handle.join().unwrap();

    assert_eq!(status, 0);
    assert_eq!(overlapped, FAILED_STATUS);
    assert_eq!(executor.output_string(), "");
}

#[test]
fn test_send_input_feeds_the_child_stdin() {
    let executor = Arc::new(sh_executor());

    let feeder = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        feeder.send_input(b"hello\n").unwrap();
    });

    let status = executor.execute_command("read line; echo got:$line");
    handle.join().unwrap();
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "got:hello\n");
}

#[test]
fn test_send_input_from_async_context_does_not_panic() {
    let executor = Arc::new(sh_executor());

    let feeder = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        // Inside a runtime the send must not reach `blocking_send`.
        runtime.block_on(async {
            feeder.send_input(b"from-async\n").unwrap();
        });
        feeder.close_input();
    });

    let status = executor.execute_command("cat");
    handle.join().unwrap();
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "from-async\n");
}

#[test]
fn test_close_input_delivers_eof() {
    let executor = Arc::new(sh_executor());

    let feeder = executor.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        feeder.send_input(b"first\nsecond\n").unwrap();
        feeder.close_input();
    });

    // `cat` exits only once its stdin reaches end of file.
    let status = executor.execute_command("cat");
    handle.join().unwrap();
    assert_eq!(status, 0);
    assert_eq!(executor.output_string(), "first\nsecond\n");
}
