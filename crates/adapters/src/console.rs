//! Interactive operator on stdin/stdout
//!
//! Prompts for region, tag count, interval, source path, enrichment toggle,
//! and resume confirmation. Presets (usually from CLI flags) answer a prompt
//! without asking, which also makes unattended runs possible.

use linkdrip_domain::{FreshSetup, Operator, OperatorError, RunConfig, SourceHandle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// How many malformed answers are re-asked before the run is abandoned
const MAX_PROMPT_ATTEMPTS: u32 = 5;

/// Pre-supplied answers that suppress individual prompts
#[derive(Debug, Clone, Default)]
pub struct OperatorPresets {
    pub region: Option<String>,
    pub tags_per_item: Option<usize>,
    pub interval_secs: Option<u64>,
    pub use_enrichment: Option<bool>,
    pub source_path: Option<PathBuf>,
    pub assume_resume: Option<bool>,
}

/// Operator implementation reading answers from stdin
pub struct ConsoleOperator {
    presets: OperatorPresets,
    default_source: PathBuf,
    fetch_url: Option<String>,
}

impl ConsoleOperator {
    pub fn new(
        presets: OperatorPresets,
        default_source: PathBuf,
        fetch_url: Option<String>,
    ) -> Self {
        Self {
            presets,
            default_source,
            fetch_url,
        }
    }

    fn prompt(&self, question: &str) -> Result<String, OperatorError> {
        print!("{question} ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn prompt_nonempty(&self, question: &str) -> Result<String, OperatorError> {
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            let answer = self.prompt(question)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            println!("Please enter a value.");
        }
        Err(OperatorError::Invalid(format!(
            "no usable answer to '{question}'"
        )))
    }

    fn prompt_positive(&self, question: &str) -> Result<u64, OperatorError> {
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            let answer = self.prompt(question)?;
            match answer.parse::<u64>() {
                Ok(value) if value > 0 => return Ok(value),
                _ => println!("Please enter a positive number."),
            }
        }
        Err(OperatorError::Invalid(format!(
            "no usable answer to '{question}'"
        )))
    }

    fn prompt_yes_no(&self, question: &str) -> Result<bool, OperatorError> {
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            let answer = self.prompt(question)?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("Please answer y or n."),
            }
        }
        Err(OperatorError::Invalid(format!(
            "no usable answer to '{question}'"
        )))
    }
}

impl Operator for ConsoleOperator {
    fn confirm_resume(&self, config: &RunConfig) -> Result<bool, OperatorError> {
        if let Some(answer) = self.presets.assume_resume {
            return Ok(answer);
        }

        println!("A previous run was found:");
        println!("  region: {}", config.region);
        println!("  tags per item: {}", config.tags_per_item);
        println!("  interval: {} seconds", config.interval_secs);
        println!("  items remaining: {}", config.remaining.len());

        self.prompt_yes_no("Continue the previous run? (y/n):")
    }

    fn collect_setup(&self) -> Result<FreshSetup, OperatorError> {
        let region = match &self.presets.region {
            Some(region) => region.clone(),
            None => self
                .prompt_nonempty("Region for trend lookups (e.g. turkey, united-states):")?
                .to_lowercase(),
        };

        let tags_per_item = match self.presets.tags_per_item {
            Some(count) => count,
            None => self.prompt_positive("How many tags per item? (e.g. 3):")? as usize,
        };

        let interval_secs = match self.presets.interval_secs {
            Some(interval) => interval,
            None => self.prompt_positive("Seconds between published items?")?,
        };

        let use_enrichment = match self.presets.use_enrichment {
            Some(enabled) => enabled,
            None => self.prompt_yes_no("Generate a caption for each item? (y/n):")?,
        };

        let path = match &self.presets.source_path {
            Some(path) => path.clone(),
            None => {
                let answer = self.prompt(&format!(
                    "Path to the item file [{}]:",
                    self.default_source.display()
                ))?;
                if answer.is_empty() {
                    self.default_source.clone()
                } else {
                    PathBuf::from(answer)
                }
            }
        };

        Ok(FreshSetup {
            region,
            tags_per_item,
            interval_secs,
            use_enrichment,
            source: SourceHandle {
                path,
                fetch_url: self.fetch_url.clone(),
            },
        })
    }
}
