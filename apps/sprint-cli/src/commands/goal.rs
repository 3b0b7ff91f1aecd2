// goal.rs — Goal subcommands: create, show, list, invite, join, leave,
// extend, complete, delete.

use clap::Subcommand;
use sprint_goal::Goal;

use super::{parse_deadline, print_json, truncate, Context};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new goal owned by the current user.
    Create {
        /// Goal title, 10-100 characters (e.g., "Run a half marathon").
        title: String,
        /// Longer description of the goal, 10-500 characters.
        #[arg(long)]
        desc: String,
        /// Deadline as an RFC 3339 timestamp.
        #[arg(long)]
        deadline: String,
    },
    /// Show details and tasks for a goal.
    Show {
        /// Goal ID.
        id: String,
    },
    /// List every goal (restricted to privileged roles).
    List,
    /// Print the goal's invite code, issuing one if needed. Author only.
    Invite {
        /// Goal ID.
        id: String,
    },
    /// Join a goal as a mentor using its invite code.
    Join {
        /// Invite code shared by the author.
        code: String,
    },
    /// Give up your mentor slot on a goal.
    Leave {
        /// Goal ID.
        id: String,
    },
    /// Move a goal's deadline later. Mentors only.
    Extend {
        /// Goal ID.
        id: String,
        /// New deadline as an RFC 3339 timestamp.
        deadline: String,
    },
    /// Mark a goal completed. Mentors only.
    Complete {
        /// Goal ID.
        id: String,
    },
    /// Delete a goal. Author only.
    Delete {
        /// Goal ID.
        id: String,
    },
}

pub fn execute(cmd: &GoalCommands, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        GoalCommands::Create {
            title,
            desc,
            deadline,
        } => create_goal(ctx, title, desc, deadline),
        GoalCommands::Show { id } => show_goal(ctx, id),
        GoalCommands::List => list_goals(ctx),
        GoalCommands::Invite { id } => {
            let code = ctx.service.goals.invite(id, ctx.username()?)?;
            println!("Invite code: {}", code);
            Ok(())
        }
        GoalCommands::Join { code } => {
            let goal_id = ctx.service.goals.join(code, ctx.username()?)?;
            println!("Joined goal {} as mentor.", goal_id);
            Ok(())
        }
        GoalCommands::Leave { id } => {
            ctx.service.goals.leave_goal(id, ctx.username()?)?;
            println!("Left goal {}.", id);
            Ok(())
        }
        GoalCommands::Extend { id, deadline } => {
            let new_deadline = parse_deadline(deadline)?;
            ctx.service
                .goals
                .extend_deadline(id, ctx.username()?, new_deadline)?;
            println!("Deadline for {} extended to {}.", id, new_deadline.to_rfc3339());
            Ok(())
        }
        GoalCommands::Complete { id } => {
            ctx.service.goals.complete_goal(id, ctx.username()?)?;
            println!("Goal {} completed.", id);
            Ok(())
        }
        GoalCommands::Delete { id } => {
            ctx.service.goals.delete_goal(id, ctx.username()?)?;
            println!("Deleted goal {}.", id);
            Ok(())
        }
    }
}

fn create_goal(ctx: &Context, title: &str, desc: &str, deadline: &str) -> anyhow::Result<()> {
    let deadline = parse_deadline(deadline)?;
    let goal_id = ctx
        .service
        .goals
        .create_goal(ctx.username()?, title, desc, deadline)?;
    println!("Goal created: {}", goal_id);
    Ok(())
}

fn show_goal(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let g = ctx.service.goals.get_goal(id)?;
    if ctx.json {
        return print_json(&g);
    }
    print_goal(&g);
    Ok(())
}

fn print_goal(g: &Goal) {
    println!("Goal:     {}", g.id);
    println!("Title:    {}", g.title);
    if !g.desc.is_empty() {
        println!("Desc:     {}", g.desc);
    }
    println!("Author:   {}", g.author);
    println!("Mentor 1: {}", g.mentor1.as_deref().unwrap_or("-"));
    println!("Mentor 2: {}", g.mentor2.as_deref().unwrap_or("-"));
    println!("Status:   {}", g.status);
    println!("Deadline: {}", g.deadline.to_rfc3339());
    println!("Created:  {}", g.created_at.to_rfc3339());
    println!("Updated:  {}", g.updated_at.to_rfc3339());

    if g.tasks.is_empty() {
        println!("\nNo tasks.");
        return;
    }
    println!();
    println!("{:<38} {:<30} {:<10} {:<12}", "TASK", "DESC", "STATUS", "ASSIGNED BY");
    println!("{}", "-".repeat(92));
    for t in g.tasks.iter() {
        println!(
            "{:<38} {:<30} {:<10} {:<12}",
            t.id,
            truncate(&t.desc, 28),
            t.status.to_string(),
            t.assigned_by,
        );
    }
}

fn list_goals(ctx: &Context) -> anyhow::Result<()> {
    let goals = ctx.service.goals.get_all_goals(ctx.principal()?)?;
    if ctx.json {
        return print_json(&goals);
    }

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<30} {:<12} {:<12}",
        "ID", "TITLE", "STATUS", "AUTHOR"
    );
    println!("{}", "-".repeat(94));

    for g in &goals {
        println!(
            "{:<38} {:<30} {:<12} {:<12}",
            g.id,
            truncate(&g.title, 28),
            g.status.to_string(),
            g.author,
        );
    }
    println!("\n{} goal(s) total.", goals.len());

    Ok(())
}
