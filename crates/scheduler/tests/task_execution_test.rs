//! 单任务执行行为

mod common;

use dataxweb_domain::{ExecutionType, TaskLogStatus};
use dataxweb_errors::SchedulerError;

use common::*;

#[tokio::test]
async fn test_run_task_success_returns_output() {
    let env = build_env();
    env.store.put_task(make_task(1, "sync", OK_CONFIG));

    let output = env
        .scheduler
        .run_task(1, ExecutionType::Manual)
        .await
        .unwrap();
    assert_eq!(output, "OK\n");

    // 独立执行：无任务流上下文
    let logs = env.store.task_logs();
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.status, TaskLogStatus::Success);
    assert_eq!(log.flow_execution_id, None);
    assert_eq!(log.step_id, None);
    assert_eq!(log.step_order, None);
    assert_eq!(log.execution_type, ExecutionType::Manual);
    assert_eq!(log.log, "OK\n");
}

#[tokio::test]
async fn test_run_task_failure_writes_failed_log() {
    let env = build_env();
    env.store.put_task(make_task(1, "sync", FAIL_CONFIG));

    let err = env
        .scheduler
        .run_task(1, ExecutionType::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::TaskExecution(_)));

    let logs = env.store.task_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, TaskLogStatus::Failed);
    assert_eq!(logs[0].log, "BOOM\n");
}

#[tokio::test]
async fn test_empty_config_writes_fixed_message() {
    let env = build_env();
    env.store.put_task(make_task(1, "empty", ""));

    let err = env
        .scheduler
        .run_task(1, ExecutionType::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::EmptyTaskConfig));

    let logs = env.store.task_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, TaskLogStatus::Failed);
    assert_eq!(logs[0].log, "任务配置为空，无法执行");

    // 槽位已释放，可以再次执行
    assert!(!env.scheduler.is_task_running(1).await);
}

#[tokio::test]
async fn test_missing_task_writes_no_log() {
    let env = build_env();

    let err = env
        .scheduler
        .run_task(999, ExecutionType::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::TaskNotFound { id: 999 }));
    assert!(env.store.task_logs().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_run_is_rejected_without_side_effects() {
    let env = build_env();
    env.store.put_task(make_task(1, "slow", SLEEP_CONFIG));

    let scheduler = env.scheduler.clone();
    let run = tokio::spawn(async move { scheduler.run_task(1, ExecutionType::Manual).await });

    wait_until_task_running(&env.scheduler, 1).await;
    let logs_before = env.store.task_logs().len();

    let err = env
        .scheduler
        .run_task(1, ExecutionType::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::TaskAlreadyRunning { id: 1 }));
    // 冲突不产生新日志行
    assert_eq!(env.store.task_logs().len(), logs_before);

    env.scheduler.kill_task(1).await.unwrap();
    let err = run.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_kill_task_marks_killed() {
    let env = build_env();
    env.store.put_task(make_task(1, "slow", SLEEP_CONFIG));

    let scheduler = env.scheduler.clone();
    let run = tokio::spawn(async move { scheduler.run_task(1, ExecutionType::Manual).await });

    wait_until_task_running(&env.scheduler, 1).await;
    env.scheduler.kill_task(1).await.unwrap();

    let err = run.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());

    let logs = env.store.task_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, TaskLogStatus::Killed);
    assert!(!env.scheduler.is_task_running(1).await);

    // 终止后再 kill 报未运行
    let err = env.scheduler.kill_task(1).await.unwrap_err();
    assert!(matches!(err, SchedulerError::TaskNotRunning { id: 1 }));
}

#[tokio::test]
async fn test_temp_file_cleaned_up() {
    let env = build_env();
    env.store.put_task(make_task(1, "sync", OK_CONFIG));

    env.scheduler
        .run_task(1, ExecutionType::Manual)
        .await
        .unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(env.temp_dir_path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(leftovers.is_empty(), "临时作业文件应在执行后删除");
}

#[tokio::test]
async fn test_run_task_with_explicit_date() {
    use chrono::NaiveDate;

    let env = build_env();
    std::fs::write(env.datax_script_path(), "cat \"$1\"\n").unwrap();
    env.store.put_task(make_task(
        1,
        "backfill",
        r#"{"job": {"content": []}, "where": "dt = '${yyyy-mm-dd}'"}"#,
    ));

    let date = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    let output = env
        .scheduler
        .run_task_with_date(1, Some(date), ExecutionType::Manual)
        .await
        .unwrap();
    assert!(output.contains("dt = '2024-03-15'"));
}

#[tokio::test]
async fn test_placeholders_rendered_into_job_file() {
    let env = build_env();
    // 桩脚本把收到的配置内容回显出来
    std::fs::write(env.datax_script_path(), "cat \"$1\"\n").unwrap();
    env.store.put_task(make_task(
        1,
        "sync",
        r#"{"job": {"content": []}, "path": "/w/dt=${yyyy-mm-dd}"}"#,
    ));

    let output = env
        .scheduler
        .run_task(1, ExecutionType::Manual)
        .await
        .unwrap();
    assert!(!output.contains("${yyyy-mm-dd}"));
    assert!(output.contains("/w/dt=2"));
}
