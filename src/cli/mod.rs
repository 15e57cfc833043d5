use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::profile::ProfileInput;
use crate::ux::Tab;

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "anthropic")]
    Anthropic,
    #[value(alias = "ollama")]
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "fitcoach", version, about = "Personalized workout and diet plans from an LLM")]
pub struct Args {
    /// TOML config file
    #[arg(long, env = "FITCOACH_CONFIG")]
    pub config: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum)]
    pub image_provider: Option<ProviderKind>,

    #[arg(long)]
    pub image_model: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "FITCOACH_STATE_DIR")]
    pub state_dir: Option<String>,

    /// Write every provider request/response under <state dir>/tx
    #[arg(long, default_value_t = false)]
    pub save_exchange: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a profile and generate a new plan
    Generate(ProfileArgs),
    /// Replace the stored plan with a fresh one for the stored profile
    Regenerate,
    /// Print the stored plan
    Show {
        #[arg(long, value_enum, default_value_t = Tab::Workout)]
        tab: Tab,
    },
    /// Write the stored plan (both tabs) as a printable Markdown document
    Export {
        /// Output file; stdout when absent
        #[arg(long)]
        out: Option<String>,
    },
    /// Generate an image for an exercise or meal item ("title|image prompt")
    Visualize {
        item: String,
        /// Write the image here instead of printing its reference
        #[arg(long)]
        out: Option<String>,
    },
    /// Quick tips for a profile (the stored one when no profile is given)
    Tips(ProfileArgs),
    /// Read the plan narration aloud
    Speak {
        #[arg(long, value_enum, default_value_t = Tab::Workout)]
        tab: Tab,
    },
    /// Split free-form plan text into sections (stdin when no file)
    Sections { file: Option<String> },
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Forget the stored plan and profile
    Clear,
}

#[derive(ClapArgs, Debug, Default, Clone)]
pub struct ProfileArgs {
    /// JSON file with the profile; flags override its fields
    #[arg(long)]
    pub profile: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    /// male | female | other
    #[arg(long)]
    pub gender: Option<String>,
    /// Height in cm
    #[arg(long)]
    pub height: Option<String>,
    /// Weight in kg
    #[arg(long)]
    pub weight: Option<String>,
    /// Weight Loss | Muscle Gain | Improve Endurance | General Fitness
    #[arg(long)]
    pub goal: Option<String>,
    /// Beginner | Intermediate | Advanced
    #[arg(long)]
    pub level: Option<String>,
    /// Home | Gym | Outdoor
    #[arg(long)]
    pub location: Option<String>,
    /// Veg | Non-Veg | Vegan | Keto | Balanced
    #[arg(long)]
    pub diet: Option<String>,
    #[arg(long)]
    pub medical_history: Option<String>,
    #[arg(long)]
    pub stress_level: Option<String>,
}

impl ProfileArgs {
    pub fn is_empty(&self) -> bool {
        self.profile.is_none() && self.flags().is_empty()
    }

    fn flags(&self) -> Vec<(&'static str, &String)> {
        [
            ("name", &self.name),
            ("age", &self.age),
            ("gender", &self.gender),
            ("height", &self.height),
            ("weight", &self.weight),
            ("fitnessGoal", &self.goal),
            ("currentFitnessLevel", &self.level),
            ("workoutLocation", &self.location),
            ("dietaryPreferences", &self.diet),
            ("medicalHistory", &self.medical_history),
            ("stressLevel", &self.stress_level),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k, v)))
        .collect()
    }

    /// Merge the profile file (if any) with the flags into a raw submission.
    /// Nothing is validated here.
    pub fn to_input(&self) -> Result<ProfileInput> {
        let mut doc = match &self.profile {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                serde_json::from_str::<Map<String, Value>>(&raw)
                    .with_context(|| format!("parsing profile {path}"))?
            }
            None => Map::new(),
        };
        for (k, v) in self.flags() {
            doc.insert(k.to_string(), Value::String(v.clone()));
        }
        Ok(ProfileInput::from(doc))
    }
}
