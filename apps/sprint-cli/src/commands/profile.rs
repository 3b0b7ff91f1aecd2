// profile.rs — Profile subcommands: register, show.

use clap::Subcommand;
use sprint_goal::{GoalSummary, NewUser};

use super::{print_json, truncate, Context};

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Register a user and create their empty profile.
    Register {
        /// Username: 4-10 characters of a-z, 0-9, '_' or '-'.
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Show a profile (defaults to the current user).
    Show {
        username: Option<String>,
    },
}

pub fn execute(cmd: &ProfileCommands, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        ProfileCommands::Register {
            username,
            first_name,
            last_name,
        } => {
            let profile = ctx
                .service
                .profiles
                .create_profile(&NewUser::new(username, first_name, last_name))?;
            println!("Registered {}.", profile.username);
            Ok(())
        }
        ProfileCommands::Show { username } => {
            let username = match username {
                Some(u) => u.as_str(),
                None => ctx.username()?,
            };
            let p = ctx.service.profiles.get_profile(username)?;
            if ctx.json {
                return print_json(&p);
            }
            println!("User:      {} ({} {})", p.username, p.first_name, p.last_name);
            println!("Completed: {}", p.num_goals_completed);
            println!("Mentored:  {}", p.num_goals_mentored);
            print_summaries("Goals", &p.goals);
            print_summaries("Mentoring", &p.mentored);
            Ok(())
        }
    }
}

fn print_summaries(heading: &str, list: &[GoalSummary]) {
    println!("\n{} ({}):", heading, list.len());
    for s in list {
        println!("  {:<38} {:<30} by {}", s.id, truncate(&s.title, 28), s.author);
    }
}
