use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use fs_err as fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fitcoach::actions::{ActionError, Coach};
use fitcoach::cli::{Args, Command};
use fitcoach::config::Config;
use fitcoach::errors::CoachError;
use fitcoach::log::{self, ExchangeLog};
use fitcoach::profile::ProfileInput;
use fitcoach::sections::{parse_content, Selection};
use fitcoach::session::{FileStore, PlanSession};
use fitcoach::speech::{voice_text, CommandEngine, Speaker};
use fitcoach::wire::GeneratedImage;
use fitcoach::{provider, server, ux};

fn build_config(args: &Args) -> Result<Config> {
    let mut cfg = Config::load_or_default(args.config.as_deref().map(Path::new))?;
    if let Some(p) = args.provider {
        cfg.provider = p;
    }
    if let Some(m) = &args.model {
        cfg.model = m.clone();
    }
    if let Some(p) = args.image_provider {
        cfg.image_provider = p;
    }
    if let Some(m) = &args.image_model {
        cfg.image_model = m.clone();
    }
    if let Some(t) = args.timeout_secs {
        cfg.timeout_secs = t;
    }
    if let Some(d) = &args.state_dir {
        cfg.state_dir = d.into();
    }
    Ok(cfg)
}

/// Print what the user needs to fix and turn it into the process error.
fn report(e: ActionError) -> anyhow::Error {
    eprintln!("{}", e.error.red().bold());
    if let Some(fields) = &e.field_errors {
        for (field, msg) in fields {
            eprintln!("  {}: {}", field.yellow(), msg);
        }
    }
    anyhow!(e.error)
}

fn no_session() {
    println!("No plan yet. Run `fitcoach generate` first.");
}

async fn save_image(img: &GeneratedImage, out: &str, timeout_secs: u64) -> Result<()> {
    let bytes = match img.decode_data_uri() {
        Some(b) => b,
        None if img.is_data_uri() => return Err(anyhow!("image data URI could not be decoded")),
        None => {
            let client = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
            let resp = client.get(&img.image_url).send().await.context("image download failed")?;
            resp.error_for_status()?.bytes().await?.to_vec()
        }
    };
    fs::write(out, &bytes)?;
    println!("Saved image to {}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    log::init_tracing(args.debug);

    let cfg = build_config(&args)?;
    let progress = !args.no_progress;

    let text = provider::make_provider(cfg.provider, cfg.model.clone(), &cfg);
    // Only the image model matters to the image provider.
    let images = provider::make_provider(cfg.image_provider, cfg.image_model.clone(), &cfg);
    let mut coach = Coach::new(text, images);
    if args.save_exchange {
        let xlog = ExchangeLog::new(&cfg.state_dir);
        tracing::info!("saving exchanges in {}", xlog.dir().display());
        coach = coach.with_exchange_log(xlog);
    }

    let session = PlanSession::new(FileStore::new(&cfg.state_dir));

    match args.command {
        Command::Generate(p) => {
            let input = p.to_input()?;
            let pb = ux::spinner("Generating your plan...", progress);
            let result = coach.generate_plan(&input).await;
            pb.finish_and_clear();

            let out = result.into_result().map_err(report)?;
            session.save(&out.plan, &out.user_details)?;
            print!("{}", ux::render_plan(&out.plan, ux::Tab::Workout));
            println!("\nSee the diet plan with `fitcoach show --tab diet`.");
        }

        Command::Regenerate => {
            let profile = match session.load_profile() {
                Ok(p) => p,
                Err(CoachError::MissingSession) => {
                    no_session();
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let pb = ux::spinner("Regenerating your plan...", progress);
            let result = coach.regenerate_plan(&ProfileInput::from(&profile)).await;
            pb.finish_and_clear();

            let out = result.into_result().map_err(report)?;
            session.replace_plan(&out.plan)?;
            println!("{}", "Plan Regenerated! Your new plan is ready.".green().bold());
            print!("{}", ux::render_plan(&out.plan, ux::Tab::Workout));
        }

        Command::Show { tab } => match session.load() {
            Ok((plan, profile)) => {
                println!("Plan for {}", profile.name.bold());
                print!("{}", ux::render_plan(&plan, tab));
            }
            Err(CoachError::MissingSession) => no_session(),
            Err(e) => return Err(e.into()),
        },

        Command::Export { out } => match session.load() {
            Ok((plan, profile)) => {
                let doc = ux::render_document(&plan, &profile);
                match out {
                    Some(path) => {
                        fs::write(&path, doc)?;
                        println!("Exported plan to {}", path);
                    }
                    None => print!("{}", doc),
                }
            }
            Err(CoachError::MissingSession) => no_session(),
            Err(e) => return Err(e.into()),
        },

        Command::Visualize { item, out } => {
            let sel = Selection::parse(&item);
            let pb = ux::spinner(&format!("Visualizing {}...", sel.title), progress);
            let result = coach.generate_item_image(&sel.image_prompt).await;
            pb.finish_and_clear();

            let img = result.into_result().map_err(report)?;
            match out {
                Some(path) => save_image(&img, &path, cfg.timeout_secs).await?,
                None if img.is_data_uri() => {
                    println!("Visualization for: {} ({} byte data URI, use --out to save)", sel.title, img.image_url.len());
                }
                None => println!("Visualization for: {}\n{}", sel.title, img.image_url),
            }
        }

        Command::Tips(p) => {
            let input = if p.is_empty() {
                match session.load_profile() {
                    Ok(profile) => ProfileInput::from(&profile),
                    Err(CoachError::MissingSession) => {
                        no_session();
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                p.to_input()?
            };
            let pb = ux::spinner("Thinking of tips...", progress);
            let result = coach.generate_tips(&input).await;
            pb.finish_and_clear();
            print!("{}", ux::render_tips(&result.into_result().map_err(report)?));
        }

        Command::Speak { tab } => {
            let (plan, _) = match session.load() {
                Ok(v) => v,
                Err(CoachError::MissingSession) => {
                    no_session();
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let mut speaker = Speaker::new(CommandEngine::detect());
            if !speaker.supported() {
                println!("Text-to-speech is not available (install espeak-ng, espeak or say).");
                return Ok(());
            }
            if speaker.speak(&voice_text(&plan, tab)) {
                println!("Reading your plan... (Ctrl-C to stop)");
            }
            while speaker.speaking() {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        speaker.cancel();
                    }
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {
                        speaker.poll();
                    }
                }
            }
        }

        Command::Sections { file } => {
            let text = match file {
                Some(f) => fs::read_to_string(f)?,
                None => {
                    let mut s = String::new();
                    std::io::stdin().read_to_string(&mut s)?;
                    s
                }
            };
            print!("{}", ux::render_sections(&parse_content(&text)));
        }

        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.bind.clone());
            server::serve(Arc::new(coach), &bind).await?;
        }

        Command::Clear => {
            if ux::confirm("Forget the stored plan and profile?") {
                session.clear()?;
                println!("Cleared.");
            }
        }
    }

    Ok(())
}
