// task.rs — Task subcommands: create, list, submit, approve, submission,
// delete.

use clap::Subcommand;
use sprint_goal::Submission;

use super::{parse_deadline, print_json, truncate, Context};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to a goal. Author or mentors.
    Create {
        /// Goal ID.
        goal_id: String,
        /// What needs doing.
        desc: String,
        /// Task deadline (RFC 3339), no later than the goal deadline.
        #[arg(long)]
        deadline: String,
    },
    /// List a goal's tasks, most recent first.
    List {
        /// Goal ID.
        goal_id: String,
    },
    /// Submit work for a task. Author only.
    Submit {
        /// Goal ID.
        goal_id: String,
        /// Task ID.
        task_id: String,
        /// Note for the reviewing mentor, 10-50 characters.
        #[arg(long)]
        comment: String,
        /// Link to the work.
        #[arg(long)]
        link: String,
    },
    /// Approve a submitted task. Mentors only.
    Approve {
        /// Goal ID.
        goal_id: String,
        /// Task ID.
        task_id: String,
    },
    /// Show the pending submission for a task.
    Submission {
        /// Goal ID.
        goal_id: String,
        /// Task ID.
        task_id: String,
    },
    /// Delete a task. Author or mentors.
    Delete {
        /// Goal ID.
        goal_id: String,
        /// Task ID.
        task_id: String,
    },
}

pub fn execute(cmd: &TaskCommands, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        TaskCommands::Create {
            goal_id,
            desc,
            deadline,
        } => {
            let deadline = parse_deadline(deadline)?;
            let task_id = ctx
                .service
                .tasks
                .create_task(goal_id, ctx.username()?, desc, deadline)?;
            println!("Task created: {}", task_id);
            Ok(())
        }
        TaskCommands::List { goal_id } => list_tasks(ctx, goal_id),
        TaskCommands::Submit {
            goal_id,
            task_id,
            comment,
            link,
        } => {
            ctx.service.tasks.submit_task(
                goal_id,
                task_id,
                ctx.username()?,
                Submission::new(comment, link),
            )?;
            println!("Submitted task {} for review.", task_id);
            Ok(())
        }
        TaskCommands::Approve { goal_id, task_id } => {
            ctx.service
                .tasks
                .approve_task(goal_id, task_id, ctx.username()?)?;
            println!("Approved task {}.", task_id);
            Ok(())
        }
        TaskCommands::Submission { goal_id, task_id } => {
            let submission = ctx
                .service
                .tasks
                .get_submission(goal_id, task_id, ctx.username()?)?;
            if ctx.json {
                return print_json(&submission);
            }
            println!("Comment: {}", submission.comment);
            println!("Link:    {}", submission.link);
            Ok(())
        }
        TaskCommands::Delete { goal_id, task_id } => {
            ctx.service
                .tasks
                .delete_task(goal_id, task_id, ctx.username()?)?;
            println!("Deleted task {}.", task_id);
            Ok(())
        }
    }
}

fn list_tasks(ctx: &Context, goal_id: &str) -> anyhow::Result<()> {
    let goal = ctx.service.goals.get_goal(goal_id)?;
    let tasks: Vec<_> = goal.tasks.iter().collect();
    if ctx.json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks for goal {}.", goal_id);
        return Ok(());
    }

    println!(
        "{:<38} {:<30} {:<10} {:<26}",
        "ID", "DESC", "STATUS", "DEADLINE"
    );
    println!("{}", "-".repeat(106));
    for t in &tasks {
        println!(
            "{:<38} {:<30} {:<10} {:<26}",
            t.id,
            truncate(&t.desc, 28),
            t.status.to_string(),
            t.deadline.to_rfc3339(),
        );
    }
    println!("\n{} task(s) total.", tasks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{as_user, context};
    use chrono::{Duration, Utc};
    use sprint_goal::TaskStatus;

    /// Goal by alice, mentored by bobby, with one task. Returns ids.
    fn setup(ctx: &Context) -> (String, String) {
        let goals = &ctx.service.goals;
        let goal_id = goals
            .create_goal("alice", "Write a novel", "Fifty thousand words", Utc::now() + Duration::days(30))
            .unwrap();
        let code = goals.invite(&goal_id, "alice").unwrap();
        goals.join(&code, "bobby").unwrap();
        let task_id = ctx
            .service
            .tasks
            .create_task(&goal_id, "alice", "Chapter 1", Utc::now() + Duration::days(3))
            .unwrap();
        (goal_id, task_id)
    }

    #[test]
    fn submit_and_approve_through_commands() {
        let ctx = context("alice");
        let (goal_id, task_id) = setup(&ctx);

        execute(
            &TaskCommands::Submit {
                goal_id: goal_id.clone(),
                task_id: task_id.clone(),
                comment: "first draft of chapter one".into(),
                link: "https://example.com/ch1".into(),
            },
            &ctx,
        )
        .unwrap();

        let ctx = as_user(ctx, "bobby");
        execute(
            &TaskCommands::Submission {
                goal_id: goal_id.clone(),
                task_id: task_id.clone(),
            },
            &ctx,
        )
        .unwrap();
        execute(
            &TaskCommands::Approve {
                goal_id: goal_id.clone(),
                task_id: task_id.clone(),
            },
            &ctx,
        )
        .unwrap();

        let g = ctx.service.goals.get_goal(&goal_id).unwrap();
        assert_eq!(g.tasks.get(&task_id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn submit_rejects_blank_comment() {
        let ctx = context("alice");
        let (goal_id, task_id) = setup(&ctx);
        let err = execute(
            &TaskCommands::Submit {
                goal_id: goal_id.clone(),
                task_id: task_id.clone(),
                comment: "   ".into(),
                link: "https://example.com/ch1".into(),
            },
            &ctx,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Comment is mandatory"));
        let g = ctx.service.goals.get_goal(&goal_id).unwrap();
        assert_eq!(g.tasks.get(&task_id).unwrap().status, TaskStatus::New);
    }

    #[test]
    fn create_rejects_task_past_goal_deadline() {
        let ctx = context("alice");
        let (goal_id, _) = setup(&ctx);
        let late = (Utc::now() + Duration::days(60)).to_rfc3339();
        let err = execute(
            &TaskCommands::Create {
                goal_id,
                desc: "Epilogue".into(),
                deadline: late,
            },
            &ctx,
        )
        .unwrap_err();
        assert!(err.to_string().contains("after goal deadline"));
    }

    #[test]
    fn outsider_cannot_delete_task() {
        let ctx = context("alice");
        let (goal_id, task_id) = setup(&ctx);
        let ctx = as_user(ctx, "carol");
        assert!(execute(
            &TaskCommands::Delete {
                goal_id: goal_id.clone(),
                task_id: task_id.clone()
            },
            &ctx
        )
        .is_err());
        execute(&TaskCommands::List { goal_id }, &ctx).unwrap();
    }
}
