//! Dump the table inventory of a compiled dictionary, or look stems up.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use etmorf_core::Dictionary;

#[derive(Parser, Debug)]
#[command(name = "inspect_dict", about = "Inspect a compiled etmorf dictionary")]
struct Args {
    /// Dictionary file
    dict: PathBuf,
    /// Look these stems up instead of printing the summary
    #[arg(long)]
    stem: Vec<String>,
    /// List every stem with its records
    #[arg(long)]
    all_stems: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let dict = Dictionary::load(&args.dict)
        .with_context(|| format!("loading {}", args.dict.display()))?;

    if args.all_stems {
        dict.for_each_stem(|stem, record| {
            println!(
                "{stem}\t{}\tgroup={} class={} paradigm={}{}",
                record.pos,
                record.ending_group,
                record.stem_class,
                record.paradigm,
                record
                    .root
                    .as_deref()
                    .map(|r| format!(" root={r}"))
                    .unwrap_or_default()
            );
        })?;
        return Ok(());
    }

    if !args.stem.is_empty() {
        for stem in &args.stem {
            let records = dict.lookup_stem(stem);
            if records.is_empty() {
                println!("{stem}\t####");
                continue;
            }
            for r in records {
                let endings: Vec<&str> = dict
                    .endings_of_group(r.ending_group)
                    .iter()
                    .filter_map(|e| dict.endings.get(*e as usize).map(String::as_str))
                    .collect();
                println!(
                    "{stem}\t{}\troot={}\tendings={}",
                    r.pos,
                    r.root_for(stem),
                    endings.join(",")
                );
            }
        }
        return Ok(());
    }

    println!("version      {}", dict.version);
    println!("stems        {}", dict.stem_count());
    println!("endings      {}", dict.endings.len());
    println!("groups       {}", dict.ending_groups.len());
    println!("forms        {}", dict.forms.len());
    println!("suffixes     {}", dict.suffixes.len());
    println!("prefixes     {}", dict.prefixes.len());
    println!("junctions    {}", dict.junctions.len());
    println!("taboo        {}", dict.taboo.len());
    println!("mwe keys     {}", dict.mwe_keys.len());
    println!("guess (end)  {}", dict.guess_endings.len());
    println!("guess (stem) {}", dict.guess_stems.len());
    Ok(())
}
