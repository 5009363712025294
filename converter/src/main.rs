use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use bbm_core::codec::FrameCodec;
use bbm_core::decode::BbmReader;
use bbm_core::encode::BbmWriter;
use bbm_core::firmware::{self, FwVariant};
use bbm_core::format::Movie;

#[derive(Clone, Copy, ValueEnum)]
enum FwVariantArg {
    /// One duration byte + nibble-packed brightness per frame
    Simple,
    /// RLE compression with cross-frame back-references
    Compressed,
}

impl From<FwVariantArg> for FwVariant {
    fn from(arg: FwVariantArg) -> Self {
        match arg {
            FwVariantArg::Simple => FwVariant::Simple,
            FwVariantArg::Compressed => FwVariant::Compressed,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "bbm-convert",
    about = "Convert Blinkenlights movies (*.bbm) to Chaosknoten data"
)]
struct Cli {
    /// Input binary blinken movie (*.bbm)
    #[arg(short, long, value_name = "BBM_FILE")]
    input: PathBuf,

    /// Output binary blinken movie (*.bbm, optional)
    #[arg(short, long, value_name = "BBM_FILE")]
    output: Option<PathBuf>,

    /// Output firmware data (*.inc, optional)
    #[arg(short, long, value_name = "INC_FILE")]
    firmware: Option<PathBuf>,

    /// Firmware stream layout
    #[arg(long, value_enum, default_value = "simple")]
    fw_variant: FwVariantArg,
}

fn read_movie(path: &Path, codec: FrameCodec) -> anyhow::Result<Movie> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let movie = BbmReader::new(BufReader::new(file), codec).read_movie()?;
    Ok(movie)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let codec = FrameCodec::chaosknoten();

    let movie = match read_movie(&cli.input, codec) {
        Ok(movie) => movie,
        Err(err) => {
            eprintln!("{}: {err:#}", cli.input.display());
            process::exit(3);
        }
    };
    eprintln!(
        "Read {} frames ({} ms) from {}",
        movie.frames.len(),
        movie.total_duration(),
        cli.input.display()
    );

    if let Some(path) = &cli.output {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        BbmWriter::new(BufWriter::new(file), codec).write_movie(&movie)?;
        eprintln!("Wrote {}", path.display());
    }

    if let Some(path) = &cli.firmware {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        firmware::write_include(&mut writer, &movie, cli.fw_variant.into())?;
        writer.flush()?;
        eprintln!("Wrote {}", path.display());
    }

    Ok(())
}
