// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task commands: the full schedule-management surface.

use crate::context::Context;
use crate::output::{format_time_until, print_json};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use warden_core::{
    format_unix, IdGen, Task, TaskHistoryStatus, TaskId, TaskKind, TaskStatus, UuidIdGen,
    PRIORITY_NORMAL,
};
use warden_engine::schedule;

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task. Exactly one of --in / --at / --cron / --every.
    Add(AddArgs),
    /// Update fields of an existing task.
    Update(UpdateArgs),
    /// List tasks, optionally filtered by status.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show the next scheduled tasks.
    Next {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// List currently running tasks.
    Running,
    /// Mark a dispatched task as completed (called by the assistant).
    Done { id: String },
    /// Pause a pending task.
    Pause { id: String },
    /// Resume a paused task.
    Resume { id: String },
    /// Remove a task and its history.
    Remove { id: String },
    /// Show dispatch history for a task.
    History {
        id: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    /// Text delivered to the assistant when the task fires.
    #[arg(long)]
    pub prompt: String,
    /// Run once, this many seconds from now.
    #[arg(long, value_name = "SEC", conflicts_with_all = ["at", "cron", "every"])]
    pub r#in: Option<i64>,
    /// Run once at this unix timestamp.
    #[arg(long, value_name = "TS", conflicts_with_all = ["cron", "every"])]
    pub at: Option<i64>,
    /// 5-field cron expression (recurring).
    #[arg(long, value_name = "EXPR", conflicts_with = "every")]
    pub cron: Option<String>,
    /// Fixed period in seconds (interval).
    #[arg(long, value_name = "SEC")]
    pub every: Option<i64>,
    /// IANA timezone for cron evaluation (default UTC).
    #[arg(long)]
    pub timezone: Option<String>,
    #[arg(long, default_value_t = PRIORITY_NORMAL)]
    pub priority: i64,
    #[arg(long)]
    pub require_idle: bool,
    /// Seconds after which an overdue occurrence is skipped.
    #[arg(long, value_name = "SEC", default_value_t = warden_core::task::DEFAULT_MISS_THRESHOLD_SECS)]
    pub miss_threshold: i64,
    #[arg(long)]
    pub reply_channel: Option<String>,
    #[arg(long)]
    pub reply_endpoint: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long, value_name = "EXPR")]
    pub cron: Option<String>,
    #[arg(long, value_name = "SEC")]
    pub every: Option<i64>,
    #[arg(long)]
    pub timezone: Option<String>,
    #[arg(long)]
    pub priority: Option<i64>,
    #[arg(long)]
    pub require_idle: Option<bool>,
    #[arg(long, value_name = "SEC")]
    pub miss_threshold: Option<i64>,
    #[arg(long)]
    pub reply_channel: Option<String>,
    #[arg(long)]
    pub reply_endpoint: Option<String>,
}

pub fn handle(ctx: &Context, command: &TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Add(args) => add(ctx, args),
        TaskCommand::Update(args) => update(ctx, args),
        TaskCommand::List { status } => list(ctx, status.as_deref()),
        TaskCommand::Next { limit } => next(ctx, *limit),
        TaskCommand::Running => running(ctx),
        TaskCommand::Done { id } => done(ctx, id),
        TaskCommand::Pause { id } => pause(ctx, id),
        TaskCommand::Resume { id } => resume(ctx, id),
        TaskCommand::Remove { id } => remove(ctx, id),
        TaskCommand::History { id, limit } => history(ctx, id, *limit),
    }
}

fn add(ctx: &Context, args: &AddArgs) -> Result<()> {
    let now = ctx.now();
    let schedule_flags =
        [args.r#in.is_some(), args.at.is_some(), args.cron.is_some(), args.every.is_some()];
    if schedule_flags.iter().filter(|set| **set).count() != 1 {
        bail!("exactly one of --in, --at, --cron, --every is required");
    }
    if args.priority < 1 {
        bail!("priority must be >= 1");
    }
    schedule::validate(args.cron.as_deref(), args.timezone.as_deref())?;

    let (kind, next_run_at) = if let Some(secs) = args.r#in {
        (TaskKind::OneTime, now + secs)
    } else if let Some(at) = args.at {
        (TaskKind::OneTime, at)
    } else if let Some(expr) = &args.cron {
        let next = schedule::next_cron_occurrence(expr, args.timezone.as_deref(), now)?
            .ok_or_else(|| anyhow::anyhow!("cron expression never fires: {expr}"))?;
        (TaskKind::Recurring, next)
    } else {
        let every = args.every.unwrap_or_default();
        if every < 1 {
            bail!("--every must be >= 1 second");
        }
        (TaskKind::Interval, now + every)
    };

    let task = Task {
        id: TaskId::new(UuidIdGen.next()),
        name: args.name.clone(),
        prompt: args.prompt.clone(),
        kind,
        cron_expression: args.cron.clone(),
        interval_seconds: args.every,
        timezone: args.timezone.clone(),
        next_run_at,
        priority: args.priority,
        require_idle: args.require_idle,
        miss_threshold: args.miss_threshold,
        reply_channel: args.reply_channel.clone(),
        reply_endpoint: args.reply_endpoint.clone(),
        status: TaskStatus::Pending,
        last_error: None,
        created_at: now,
        updated_at: now,
    };
    ctx.store.insert_task(&task)?;

    if ctx.json {
        print_json(&task)?;
    } else {
        println!("{}", task.id);
    }
    Ok(())
}

fn update(ctx: &Context, args: &UpdateArgs) -> Result<()> {
    let now = ctx.now();
    let mut task = ctx.store.task(&TaskId::new(&args.id))?;

    if args.cron.is_some() && args.every.is_some() {
        bail!("--cron and --every are mutually exclusive");
    }
    if let Some(name) = &args.name {
        task.name = name.clone();
    }
    if let Some(prompt) = &args.prompt {
        task.prompt = prompt.clone();
    }
    if let Some(timezone) = &args.timezone {
        task.timezone = Some(timezone.clone());
    }
    if let Some(expr) = &args.cron {
        task.kind = TaskKind::Recurring;
        task.cron_expression = Some(expr.clone());
        task.interval_seconds = None;
    }
    if let Some(every) = args.every {
        if every < 1 {
            bail!("--every must be >= 1 second");
        }
        task.kind = TaskKind::Interval;
        task.interval_seconds = Some(every);
        task.cron_expression = None;
    }
    schedule::validate(task.cron_expression.as_deref(), task.timezone.as_deref())?;

    // A schedule change moves the next occurrence.
    if let Some(expr) = &args.cron {
        task.next_run_at = schedule::next_cron_occurrence(expr, task.timezone.as_deref(), now)?
            .ok_or_else(|| anyhow::anyhow!("cron expression never fires: {expr}"))?;
    } else if let Some(every) = args.every {
        task.next_run_at = now + every;
    }

    if let Some(priority) = args.priority {
        if priority < 1 {
            bail!("priority must be >= 1");
        }
        task.priority = priority;
    }
    if let Some(require_idle) = args.require_idle {
        task.require_idle = require_idle;
    }
    if let Some(miss_threshold) = args.miss_threshold {
        task.miss_threshold = miss_threshold;
    }
    if let Some(reply_channel) = &args.reply_channel {
        task.reply_channel = Some(reply_channel.clone());
    }
    if let Some(reply_endpoint) = &args.reply_endpoint {
        task.reply_endpoint = Some(reply_endpoint.clone());
    }

    task.updated_at = now;
    ctx.store.update_task(&task)?;

    if ctx.json {
        print_json(&task)?;
    } else {
        println!("updated {}", task.id);
    }
    Ok(())
}

fn list(ctx: &Context, status: Option<&str>) -> Result<()> {
    let filter = match status {
        Some(s) => Some(
            TaskStatus::parse(s).ok_or_else(|| anyhow::anyhow!("unknown task status: {s}"))?,
        ),
        None => None,
    };
    let tasks = ctx.store.list_tasks(filter)?;
    print_tasks(ctx, &tasks)
}

fn next(ctx: &Context, limit: usize) -> Result<()> {
    let tasks = ctx.store.next_pending_tasks(limit)?;
    print_tasks(ctx, &tasks)
}

fn running(ctx: &Context) -> Result<()> {
    let tasks = ctx.store.running_tasks()?;
    print_tasks(ctx, &tasks)
}

fn print_tasks(ctx: &Context, tasks: &[Task]) -> Result<()> {
    if ctx.json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("no tasks");
        return Ok(());
    }
    let now = ctx.now();
    for task in tasks {
        println!(
            "{}  {:<10} {:<9} {:<9} {}",
            task.id.short(8),
            task.status,
            task.kind,
            format_time_until(task.next_run_at, now),
            task.name
        );
    }
    Ok(())
}

fn done(ctx: &Context, id: &str) -> Result<()> {
    let now = ctx.now();
    let id = TaskId::new(id);
    // Verify existence before recording anything.
    ctx.store.task(&id)?;
    ctx.store
        .set_task_status(&id, TaskStatus::Completed, None, now)?;
    ctx.store
        .append_task_history(&id, now, TaskHistoryStatus::Completed, None)?;
    println!("completed {id}");
    Ok(())
}

fn pause(ctx: &Context, id: &str) -> Result<()> {
    let id = TaskId::new(id);
    ctx.store.task(&id)?;
    ctx.store
        .set_task_status(&id, TaskStatus::Paused, None, ctx.now())?;
    println!("paused {id}");
    Ok(())
}

fn resume(ctx: &Context, id: &str) -> Result<()> {
    let now = ctx.now();
    let id = TaskId::new(id);
    let task = ctx.store.task(&id)?;
    if task.status != TaskStatus::Paused {
        bail!("task {id} is {}, not paused", task.status);
    }

    // A repeating task that slept past its occurrence picks up from the
    // next one instead of tripping the miss window immediately.
    let next_run_at = if task.next_run_at <= now {
        match task.kind {
            TaskKind::Recurring => match &task.cron_expression {
                Some(expr) => schedule::next_cron_occurrence(expr, task.timezone.as_deref(), now)?
                    .unwrap_or(task.next_run_at),
                None => task.next_run_at,
            },
            TaskKind::Interval => task
                .interval_seconds
                .map(|every| schedule::next_interval_occurrence(task.next_run_at, every, now))
                .unwrap_or(task.next_run_at),
            TaskKind::OneTime => task.next_run_at,
        }
    } else {
        task.next_run_at
    };

    ctx.store.reschedule_task(&id, next_run_at, now)?;
    println!("resumed {id}");
    Ok(())
}

fn remove(ctx: &Context, id: &str) -> Result<()> {
    if !ctx.store.remove_task(&TaskId::new(id))? {
        bail!("task {id} not found");
    }
    println!("removed {id}");
    Ok(())
}

fn history(ctx: &Context, id: &str, limit: usize) -> Result<()> {
    let id = TaskId::new(id);
    ctx.store.task(&id)?;
    let entries = ctx.store.task_history(&id, limit)?;
    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("no history");
        return Ok(());
    }
    for entry in entries {
        println!(
            "[{}] {:<9} {}",
            format_unix(entry.run_at),
            entry.status,
            entry.detail.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
