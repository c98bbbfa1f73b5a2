use anyhow::{bail, Context};
use cfn_conditions::condition::{Assignment, Comparand, Reference, MAX_DEPTH_ENV};
use cfn_conditions::{
    Condition, ConditionSet, InfluenceMap, ReferenceToken, ResolveOptions, Scenario, Template,
};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Maximum nesting of named conditions (overrides CFN_CONDITIONS_MAX_DEPTH)
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every condition with its kind and findings
    List {
        /// Path to the template file
        #[arg(short, long)]
        template: PathBuf,
    },
    /// Print the resolved tree of one condition
    Show {
        #[arg(short, long)]
        template: PathBuf,

        /// Condition name
        #[arg(short, long)]
        condition: String,
    },
    /// Print the values each parameter is compared against
    Influence {
        #[arg(short, long)]
        template: PathBuf,

        /// Restrict to one condition
        #[arg(short, long)]
        condition: Option<String>,
    },
    /// Evaluate a condition under parameter assignments
    Test {
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        condition: String,

        /// NAME=VALUE, or NAME=@OTHER to assign another reference's value
        #[arg(short, long = "set")]
        set: Vec<Assignment>,
    },
    /// Print the reference token of each name
    Token {
        names: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut options = ResolveOptions::from_env();
    if let Some(depth) = args.max_depth {
        options = options.with_max_depth(depth);
    }
    log::debug!("Using max depth {} ({})", options.max_depth, MAX_DEPTH_ENV);

    match args.command {
        Commands::List { template } => {
            let template = load(&template)?;
            let set = ConditionSet::new(&template, &options);

            if args.json {
                let rows: Vec<_> = set
                    .iter()
                    .map(|(name, condition)| {
                        json!({
                            "name": name,
                            "kind": condition.kind().label(),
                            "issues": set.issues_for(name).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (name, condition) in set.iter() {
                    println!("{}: {}", name, condition.kind().label());
                    for issue in set.issues_for(name) {
                        println!("  ! {}", issue);
                    }
                }
            }
        }
        Commands::Show {
            template,
            condition,
        } => {
            let template = load(&template)?;
            let (resolved, issues) = Condition::resolve(&template, &condition, &options);

            if args.json {
                let out = json!({
                    "name": resolved.name(),
                    "kind": resolved.kind().label(),
                    "influence": resolved.influence(),
                    "issues": issues,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", resolved.render());
                for issue in &issues {
                    println!("! {}", issue);
                }
            }
        }
        Commands::Influence {
            template,
            condition,
        } => {
            let template = load(&template)?;
            let influence = match condition {
                Some(name) => {
                    let (resolved, issues) = Condition::resolve(&template, &name, &options);
                    for issue in &issues {
                        log::warn!("{}", issue);
                    }
                    resolved.influence().clone()
                }
                None => ConditionSet::new(&template, &options).influence(),
            };

            if args.json {
                println!("{}", serde_json::to_string_pretty(&influence)?);
            } else {
                print_influence(&influence, &token_names(&template));
            }
        }
        Commands::Test {
            template,
            condition,
            set,
        } => {
            let template = load(&template)?;
            let (resolved, issues) = Condition::resolve(&template, &condition, &options);
            for issue in &issues {
                log::warn!("{}", issue);
            }
            if resolved.is_empty() && template.condition(&condition).is_none() {
                bail!("Condition '{}' is not defined", condition);
            }

            let mut scenario = Scenario::new();
            scenario.extend(set);

            let names = token_names(&template);
            for (token, value) in scenario.iter() {
                log::debug!("{} = {}", display_token(token, &names), value);
            }
            let unassigned: Vec<String> = resolved
                .unassigned(&scenario)
                .into_iter()
                .map(|token| display_token(token, &names))
                .collect();
            for token in &unassigned {
                log::warn!("No value assigned to {}; its comparisons are false", token);
            }

            let result = resolved.test(&scenario);
            if args.json {
                let out = json!({
                    "condition": condition,
                    "result": result,
                    "unassigned": unassigned,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}: {}", condition, result);
            }
        }
        Commands::Token { names } => {
            if names.is_empty() {
                bail!("No names given");
            }
            for name in names {
                println!("{}\t{}", Reference::new(name.as_str()).token(), name);
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Template> {
    let template = Template::load(path)
        .with_context(|| format!("Failed to load template {}", path.display()))?;
    log::info!(
        "Loaded {} with {} conditions",
        path.display(),
        template.condition_names().len()
    );
    Ok(template)
}

/// Token → logical name, for declared parameters and pseudo-parameters
fn token_names(template: &Template) -> HashMap<ReferenceToken, String> {
    template
        .parameter_names()
        .into_iter()
        .map(Reference::new)
        .chain(Reference::pseudo_parameters())
        .map(|reference| (reference.token(), reference.name().to_string()))
        .collect()
}

fn display_token(token: &ReferenceToken, names: &HashMap<ReferenceToken, String>) -> String {
    names
        .get(token)
        .cloned()
        .unwrap_or_else(|| token.to_string())
}

fn print_influence(influence: &InfluenceMap, names: &HashMap<ReferenceToken, String>) {
    for (token, values) in influence {
        let rendered: Vec<String> = values
            .iter()
            .map(|value| match value {
                Comparand::Literal(s) => format!("{:?}", s),
                Comparand::Reference(other) => format!("@{}", display_token(other, names)),
            })
            .collect();
        println!("{}: {}", display_token(token, names), rendered.join(", "));
    }
}
