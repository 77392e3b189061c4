use std::{error::Error, fs, path::PathBuf};

use clap::Parser;
use log::{info, warn};

use ndnlibafl::{
    inputstruct::{
        grammar::ContainerKind,
        ndn_packet::{build_data, build_interest, fallback_interest, InterestSpec},
        ndn_tlv::*,
        tlv::Element,
    },
    mutators::{DigestProvider, RingSha256, TlvMutator},
    MutatorConfig,
};

/// Writes NDN seed packets and optionally prints mutated variants of them
#[derive(Debug, Parser)]
#[command(
    name = "gen_testcase",
    about = "Generate well-formed Interest/Data seeds for the NDN packet fuzzer"
)]
struct Opt {
    #[arg(
        help = "corpus directory the seeds are written to",
        short = 'o',
        long = "out",
        default_value = "./corpus"
    )]
    out: PathBuf,

    #[arg(
        help = "print this many mutated variants (hex) of every seed",
        short = 'n',
        long = "mutations",
        default_value = "0"
    )]
    mutations: u64,

    #[arg(help = "first seed handed to the mutator", long = "seed", default_value = "0")]
    seed: u64,

    #[arg(help = "maximum size of a mutated packet", long = "max-size", default_value = "8800")]
    max_size: usize,

    #[arg(help = "mutator configuration (JSON)", short = 'c', long = "config")]
    config: Option<PathBuf>,
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn with_child(container: &Element, kind: ContainerKind, child: &Element) -> Element {
    let at = kind.grammar().insertion_point(container, child.tag());
    container.insert_child(at, child)
}

fn gen_seeds(digest: &dyn DigestProvider) -> Result<Vec<(&'static str, Vec<u8>)>, Box<dyn Error>> {
    let interest_grammar = ContainerKind::Interest.grammar();

    let plain = build_interest(
        &InterestSpec {
            name: "/ndn/edu/test",
            nonce: [0x12, 0x34, 0x56, 0x78],
            lifetime_ms: Some(4000),
            ..InterestSpec::default()
        },
        digest,
    )?;
    let prefix = build_interest(
        &InterestSpec {
            name: "/ndn/edu",
            can_be_prefix: true,
            must_be_fresh: true,
            nonce: [1, 2, 3, 4],
            hop_limit: Some(32),
            ..InterestSpec::default()
        },
        digest,
    )?;
    let hinted = with_child(
        &plain,
        ContainerKind::Interest,
        &interest_grammar.synthesize(FORWARDING_HINT),
    );
    let parameterized = fallback_interest(digest)?;

    let data = build_data("/ndn/edu/test", b"hello ndn", Some(10_000), digest)?;
    let meta_index = data.find(META_INFO).ok_or("seed Data lacks MetaInfo")?;
    let meta = with_child(
        &data.children()[meta_index],
        ContainerKind::MetaInfo,
        &Element::new(FINAL_BLOCK_ID, b"\x08\x02%0".to_vec()),
    );
    let segmented = data.replace_child(meta_index, Some(&meta));

    let sig_index = data.find(SIGNATURE_INFO).ok_or("seed Data lacks SignatureInfo")?;
    let sig_info = with_child(
        &data.children()[sig_index],
        ContainerKind::SignatureInfo,
        &ContainerKind::SignatureInfo.grammar().synthesize(KEY_LOCATOR),
    );
    let located = data.replace_child(sig_index, Some(&sig_info));

    let mut exchange = plain.encode();
    exchange.extend(data.encode());

    Ok(vec![
        ("interest_plain", plain.encode()),
        ("interest_prefix", prefix.encode()),
        ("interest_hint", hinted.encode()),
        ("interest_params", parameterized.encode()),
        ("data_plain", data.encode()),
        ("data_segment", segmented.encode()),
        ("data_keylocator", located.encode()),
        ("interest_data", exchange),
    ])
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let opt = Opt::parse();

    let config = match &opt.config {
        Some(path) => MutatorConfig::from_path(path)?,
        None => MutatorConfig::default(),
    };
    let mut mutator = TlvMutator::with_config(config);

    fs::create_dir_all(&opt.out)?;
    let seeds = gen_seeds(&RingSha256)?;
    for (name, bytes) in &seeds {
        let path = opt.out.join(name);
        fs::write(&path, bytes)?;
        info!("wrote {} ({} bytes)", path.display(), bytes.len());
    }
    println!("wrote {} seeds to {}", seeds.len(), opt.out.display());

    for (name, bytes) in &seeds {
        let mut skipped = 0;
        for i in 0..opt.mutations {
            let seed = opt.seed.wrapping_add(i);
            match mutator.mutate(bytes, opt.max_size, seed)? {
                Some(out) => println!("{name} #{seed}: {}", hex(&out)),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("{name}: {skipped} of {} mutations were no-ops", opt.mutations);
        }
    }
    Ok(())
}
