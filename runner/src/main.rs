use std::{
    io::{self, Write},
    time::Instant,
};

use anyhow::{Context, bail};
use bytegen::{ByteGen, NodeName};
use clap::{Parser, Subcommand};
use device_api::Permissions;
use devtmpfs::{DevFs, FaultPlan, NodeStat};
use io_error::IOError;
use kdriver_api::insmod;
use log::warn;
use serde::Serialize;

mod logger;

type Host = DevFs<spin::RwLock<()>>;

#[derive(Parser)]
#[command(
    version,
    about = "Loads bytegen into an in-memory /dev and talks to its nodes",
    long_about = None
)]
struct Args {
    /// off, error, warn, info, debug or trace
    #[arg(env = "BYTEGEN_LOG", long, default_value = "info")]
    log: log::LevelFilter,
    /// Also print every log record as a JSON line
    #[arg(env = "BYTEGEN_JSON_LOG", long)]
    json_log: bool,
    /// Octal umask of the host, applied to nodes of classes without a mode policy
    #[arg(env = "BYTEGEN_UMASK", long, default_value = "022", value_parser = parse_umask)]
    umask: Permissions,
    /// Fail device number allocation
    #[arg(long)]
    fail_region: bool,
    /// Fail class creation
    #[arg(long)]
    fail_class: bool,
    /// Fail the cdev binding
    #[arg(long)]
    fail_cdev: bool,
    /// Fail creation of one node, e.g. 0x10 (repeatable)
    #[arg(long, value_parser = parse_node)]
    fail_node: Vec<NodeName>,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn faults(&self) -> FaultPlan {
        let mut plan = FaultPlan::new();
        if self.fail_region {
            plan = plan.fail_region(IOError::Busy);
        }
        if self.fail_class {
            plan = plan.fail_class(IOError::OutOfMemory);
        }
        if self.fail_cdev {
            plan = plan.fail_cdev(IOError::Busy);
        }
        for node in &self.fail_node {
            plan = plan.fail_node(node.path(), IOError::OutOfMemory);
        }
        plan
    }
}

#[derive(Subcommand)]
enum Command {
    /// List every node
    Ls {
        #[arg(long)]
        json: bool,
    },
    /// Show a single node
    Stat {
        #[arg(value_parser = parse_node)]
        node: NodeName,
    },
    /// Read bytes from a node to stdout
    Read {
        #[arg(value_parser = parse_node)]
        node: NodeName,
        #[arg(short = 'n', long, default_value_t = 16)]
        count: usize,
        /// Print a hex dump instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
    /// Read a lot of bytes and report the rate
    Bench {
        #[arg(value_parser = parse_node)]
        node: NodeName,
        #[arg(long, default_value_t = 16 * 1024 * 1024)]
        bytes: u64,
        #[arg(long, default_value_t = 4096)]
        chunk: usize,
    },
    /// Attempt a write, which the device refuses
    Write {
        #[arg(value_parser = parse_node)]
        node: NodeName,
        data: String,
    },
}

fn parse_node(s: &str) -> Result<NodeName, String> {
    NodeName::from_path(s)
        .ok_or_else(|| format!("not a bytegen node: {s:?} (expected 0x00..0xff)"))
}

fn parse_umask(s: &str) -> Result<Permissions, String> {
    match u16::from_str_radix(s, 8) {
        Ok(mode) if mode <= 0o777 => Ok(Permissions::from_mode(mode)),
        _ => Err(format!("not an octal umask: {s:?}")),
    }
}

#[derive(Serialize)]
struct NodeRow {
    path: String,
    major: u32,
    minor: u32,
    /// Userspace `dev_t` encoding of major and minor.
    rdev: u64,
    mode: String,
    class: Option<String>,
}

impl From<NodeStat> for NodeRow {
    fn from(stat: NodeStat) -> Self {
        Self {
            path: format!("/dev/{}", stat.path),
            major: stat.rdev.major,
            minor: stat.rdev.minor,
            rdev: stat.rdev.encode(),
            mode: format!("{:04o}", stat.permissions.mode()),
            class: stat.class,
        }
    }
}

fn print_stat(out: &mut impl Write, stat: &NodeStat) -> io::Result<()> {
    writeln!(
        out,
        "c{} {:>3}:{:<3} /dev/{}",
        stat.permissions, stat.rdev.major, stat.rdev.minor, stat.path
    )
}

fn hexdump(out: &mut impl Write, data: &[u8]) -> io::Result<()> {
    for (i, line) in data.chunks(16).enumerate() {
        write!(out, "{:08x} ", i * 16)?;
        for byte in line {
            write!(out, " {byte:02x}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn run(host: &Host, command: Command) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match command {
        Command::Ls { json } => {
            let nodes = host.nodes();
            if json {
                let rows: Vec<NodeRow> = nodes.into_iter().map(NodeRow::from).collect();
                serde_json::to_writer_pretty(&mut out, &rows)?;
                writeln!(out)?;
            } else {
                for stat in &nodes {
                    print_stat(&mut out, stat)?;
                }
            }
        }
        Command::Stat { node } => {
            let stat = host
                .stat(&node.path())
                .with_context(|| format!("stat /dev/{}", node.path()))?;
            print_stat(&mut out, &stat)?;
        }
        Command::Read { node, count, hex } => {
            let mut file = host
                .open(&node.path())
                .with_context(|| format!("open /dev/{}", node.path()))?;
            let mut buf = vec![0u8; count];
            let read = file.read(&mut buf).context("read")?;
            if hex {
                hexdump(&mut out, &buf[..read])?;
            } else {
                out.write_all(&buf[..read])?;
            }
            file.close().context("close")?;
        }
        Command::Bench { node, bytes, chunk } => {
            if chunk == 0 {
                bail!("chunk size must be positive");
            }
            let mut file = host
                .open(&node.path())
                .with_context(|| format!("open /dev/{}", node.path()))?;
            let mut buf = vec![0u8; chunk];
            let mut total = 0u64;
            let start = Instant::now();
            while total < bytes {
                let want = chunk.min(usize::try_from(bytes - total).unwrap_or(chunk));
                let read = file.read(&mut buf[..want]).context("read")?;
                if buf[..read].iter().any(|b| *b != node.byte()) {
                    bail!("/dev/{} returned a foreign byte", node.path());
                }
                total += read as u64;
            }
            let elapsed = start.elapsed();
            let rate = (total as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64;
            writeln!(
                out,
                "read {} from /dev/{} in {elapsed:.2?} ({}/s)",
                humansize::format_size(total, humansize::BINARY),
                node.path(),
                humansize::format_size(rate, humansize::BINARY),
            )?;
        }
        Command::Write { node, data } => {
            let mut file = host
                .open(&node.path())
                .with_context(|| format!("open /dev/{}", node.path()))?;
            match file.write(data.as_bytes()) {
                Ok(n) => bail!("write of {n} bytes was accepted by a read-only device"),
                Err(e) => writeln!(out, "write refused: {e} (errno {})", e.errno())?,
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.log, args.json_log)?;

    let host = Host::with_umask(args.umask);
    host.set_faults(args.faults());

    let module = match insmod::<Host, ByteGen<'_, Host>>(&host) {
        Ok(module) => module,
        Err(e) => {
            let errno = e.errno();
            return Err(e).with_context(|| format!("insmod bytegen failed ({errno})"));
        }
    };

    if !module.missing().is_empty() {
        warn!("{} of 256 nodes missing", module.missing().len());
    }

    let result = run(&host, args.command);
    module.rmmod();
    result
}
