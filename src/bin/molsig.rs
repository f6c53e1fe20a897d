use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use molsig::*;
use std::path::PathBuf;
use tracing::*;

#[derive(Parser)]
#[command(name = "molsig", version, about = "Compute molecular signatures from SMILES")]
struct Cli {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SignatureArgs {
    /// Environment radius; -1 covers the whole molecule
    #[arg(long, default_value_t = 2, allow_hyphen_values = true)]
    radius: i64,

    /// Morgan bit space; 0 disables Morgan bits
    #[arg(long, default_value_t = 2048)]
    nbits: usize,

    /// Extra option as key=value, e.g. kekuleSmiles=true
    #[arg(long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,
}

impl SignatureArgs {
    fn options(&self) -> Result<SignatureOptions> {
        let mut options = SignatureOptions {
            radius: Radius::from(self.radius),
            nbits: self.nbits,
            ..Default::default()
        };
        for pair in &self.options {
            let (key, value) = pair
                .split_once('=')
                .context(format!("Option '{pair}' is not of the form key=value"))?;
            options.set(key.trim(), value)?;
        }
        Ok(options)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the signature of each SMILES
    Sign {
        smiles: Vec<String>,
        #[command(flatten)]
        signature: SignatureArgs,
        /// Write atoms as root-minus plus neighbours
        #[arg(long)]
        neighbors: bool,
        /// Leave Morgan bits out of the output
        #[arg(long)]
        no_morgans: bool,
    },
    /// Sign every molecule of a CSV column into a smiles,signature CSV
    Batch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "smiles")]
        column: String,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        signature: SignatureArgs,
    },
    /// Build an atom signature alphabet from a CSV column
    Alphabet {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "smiles")]
        column: String,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        signature: SignatureArgs,
    },
}

fn sign(smiles: &str, options: &SignatureOptions, neighbors: bool, morgans: bool) -> Result<String> {
    let mut signature = MoleculeSignature::from_smiles(smiles, options)?;
    if neighbors {
        signature.post_compute_neighbors(options.radius)?;
    }
    signature.to_string_with(neighbors, morgans)
}

fn read_column(input: &PathBuf, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(input).context(format!("Failed to open {}", input.display()))?;
    let position = reader
        .headers()?
        .iter()
        .position(|header| header == column)
        .context(format!("No column '{column}' in {}", input.display()))?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(position) {
            values.push(value.to_string());
        }
    }
    info!("Read {} rows from {}", values.len(), input.display());
    Ok(values)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Sign {
            smiles,
            signature,
            neighbors,
            no_morgans,
        } => {
            let options = signature.options()?;
            for smi in &smiles {
                println!("{}", sign(smi, &options, neighbors, !no_morgans)?);
            }
        }
        Command::Batch {
            input,
            column,
            output,
            signature,
        } => {
            let options = signature.options()?;
            let mut writer = csv::Writer::from_path(&output).context(format!("Failed to create {}", output.display()))?;
            writer.write_record(["smiles", "signature"])?;
            for smi in read_column(&input, &column)? {
                match sign(&smi, &options, false, options.nbits > 0) {
                    Ok(text) => writer.write_record([smi.as_str(), text.as_str()])?,
                    Err(err) => warn!("Skipping {smi}: {err:#}"),
                }
            }
            writer.flush()?;
        }
        Command::Alphabet {
            input,
            column,
            output,
            signature,
        } => {
            let options = signature.options()?;
            let mut alphabet = SignatureAlphabet::with_options(&options);
            let smiles = read_column(&input, &column)?;
            alphabet.fill(smiles.iter().map(String::as_str));
            alphabet.save(&output)?;
            println!("{alphabet}");
        }
    }
    Ok(())
}
