use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_arrange::{
    AssemblyJob, AssemblyPipeline, CancellationToken, ChannelReporter, EditorOptions,
    LopdfBackend, OutlineRenderer, PageCollection, Progress, RenderDocument, SlotId,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

mod logger;
mod ops;

use ops::Op;

#[derive(Parser)]
#[command(name = "pdfa", about = "Rearrange pages across two PDFs", version)]
struct Cli {
    /// Log progress details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page counts and sizes
    Info {
        /// PDF file(s) to inspect
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Load up to two PDFs, edit their page order and write the result
    Arrange {
        /// PDF for the left slot
        #[arg(long)]
        left: Option<PathBuf>,

        /// PDF for the right slot
        #[arg(long)]
        right: Option<PathBuf>,

        /// Edit to apply, in order (move:L:2:1, copy:L:3:R:2, delete:R:1)
        #[arg(long = "op", value_name = "OP")]
        ops: Vec<Op>,

        /// Which slot(s) to write out
        #[arg(long, default_value = "both", value_enum)]
        assemble: AssembleArg,

        /// Output file (only when assembling a single slot)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for generated file names
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Editor settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the resulting page order without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AssembleArg {
    Left,
    Right,
    Both,
}

impl AssembleArg {
    fn slots(self) -> Vec<SlotId> {
        match self {
            AssembleArg::Left => vec![SlotId::Left],
            AssembleArg::Right => vec![SlotId::Right],
            AssembleArg::Both => SlotId::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::StderrLogger::init(cli.verbose)?;

    match cli.command {
        Commands::Info { files } => {
            for path in files {
                print_info(&path).await?;
            }
        }

        Commands::Arrange {
            left,
            right,
            ops,
            assemble,
            output,
            output_dir,
            config,
            dry_run,
        } => {
            let options = match config {
                Some(path) => EditorOptions::load(&path)
                    .await
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => EditorOptions::default(),
            };

            let mut pages = PageCollection::new();
            for (slot, path) in [(SlotId::Left, left), (SlotId::Right, right)] {
                if let Some(path) = path {
                    load_slot(&mut pages, slot, &path).await?;
                }
            }

            for op in &ops {
                op.apply(&mut pages)
                    .with_context(|| format!("Failed to {op}"))?;
                log::debug!("Applied {op}");
            }

            let slots = assemble.slots();
            if output.is_some() && slots.len() > 1 {
                bail!("--output needs --assemble left or --assemble right");
            }

            for slot in slots {
                print_order(&pages, slot);
                if dry_run {
                    continue;
                }

                let job = match AssemblyJob::from_collection(&pages, slot) {
                    Ok(job) => job,
                    // Nothing was loaded here; only an error if asked for explicitly
                    Err(e @ pdf_arrange::ArrangeError::NotLoaded(_))
                        if matches!(assemble, AssembleArg::Both) =>
                    {
                        log::info!("Skipping: {e}");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                let path = match &output {
                    Some(path) => path.clone(),
                    None => output_dir.join(pdf_arrange::suggested_filename(
                        &options.assembly.filename_prefix,
                        slot,
                        chrono::Local::now(),
                    )),
                };
                assemble_slot(job, &options, &path).await?;
            }
        }
    }

    Ok(())
}

async fn print_info(path: &Path) -> Result<()> {
    let source = pdf_arrange::read_source(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = OutlineRenderer::open(&source.bytes)?;

    println!("{}: {} page(s)", source.name, document.page_count());
    for page in 1..=document.page_count() as u32 {
        let (width, height) = document.page_size(page)?;
        println!("  {:>4}  {:.0} x {:.0} pt", page, width, height);
    }
    Ok(())
}

async fn load_slot(pages: &mut PageCollection, slot: SlotId, path: &Path) -> Result<()> {
    let source = pdf_arrange::read_source(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let page_count = OutlineRenderer::open(&source.bytes)
        .with_context(|| format!("Failed to load PDF ({slot})"))?
        .page_count();

    println!(
        "PDF loaded ({} pages) - {}: {}",
        page_count, slot, source.name
    );
    pages.load_slot(slot, source.name, source.bytes, page_count);
    Ok(())
}

fn print_order(pages: &PageCollection, slot: SlotId) {
    let labels: Vec<String> = pages.sequence(slot).iter().map(|e| e.label()).collect();
    if !labels.is_empty() {
        println!("{}: {}", slot, labels.join(", "));
    }
}

async fn assemble_slot(job: AssemblyJob, options: &EditorOptions, path: &Path) -> Result<()> {
    let slot = job.slot();
    let token = CancellationToken::new();

    // Ctrl-C cancels at the next page boundary
    let ctrl_c = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Progress>();
    let printer = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            eprint!(
                "\r{} PDF generating... {}/{} ({}%)",
                slot,
                progress.current,
                progress.total,
                progress.percent()
            );
        }
        eprintln!();
    });

    let pipeline = AssemblyPipeline::new(LopdfBackend, options.assembly.clone());
    let mut reporter = ChannelReporter(progress_tx);
    let result = pipeline.run(job, &mut reporter, &token).await;

    drop(reporter);
    ctrl_c.abort();
    printer.await?;

    match result {
        Ok(document) => {
            pdf_arrange::write_output(&document.bytes, path).await?;
            println!(
                "{} PDF downloaded: {} ({} pages)",
                slot,
                path.display(),
                document.page_count
            );
            Ok(())
        }
        Err(pdf_arrange::ArrangeError::Cancelled) => {
            println!("{} PDF generation cancelled", slot);
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("{slot} PDF generation failed"))),
    }
}
