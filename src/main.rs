//! Minecraft 基岩版结构文件打包工具

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use mcsp::{
    convert, nbt_le, Config, Context, FileCalibrationStore, LevelVersions, TargetKind, Upload,
};

/// Minecraft 基岩版结构文件打包工具
#[derive(Parser)]
#[command(name = "mcsp", version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 转换结构文件
    Convert {
        /// 转换目标
        #[arg(short, long, value_enum, default_value_t = TargetKind::Library)]
        target: TargetKind,
        /// .mcstructure 文件
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// 输出目录（默认使用配置中的 output_dir）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 从参考平坦世界的 level.dat 更新校准数据
    Calibrate {
        /// level.dat 路径
        level_dat: PathBuf,
    },
    /// 生成默认配置文件
    Config {
        /// 输出路径（默认: mcsp.toml）
        #[arg(short, long, default_value = "mcsp.toml")]
        output: PathBuf,
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    match cli.command {
        Commands::Convert {
            target,
            files,
            output,
        } => {
            let output_dir = output.unwrap_or_else(|| config.convert.output_dir.clone());
            let ctx = Context::from_config(&config).context("无法初始化转换上下文")?;
            let uploads: Vec<Upload> = files.into_iter().map(Upload::from_path).collect();

            println!("转换目标: {}", target);
            println!("结构文件: {} 个", uploads.len());
            println!("输出目录: {:?}", output_dir);
            println!();

            let start = Instant::now();
            let archives = convert(&ctx, target, &uploads)?;
            for archive in archives {
                let path = archive.persist_to(&output_dir)?;
                println!("已生成: {:?}", path);
            }
            println!("\n耗时: {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Calibrate { level_dat } => {
            let data = fs::read(&level_dat).with_context(|| format!("无法读取 {:?}", level_dat))?;
            let (_, level) = nbt_le::read_level_dat(&data)?;
            let versions = LevelVersions::from_level(&level)?;
            let store = FileCalibrationStore::new(&config.calibration.dir);
            versions.store(&store)?;

            println!("已更新校准数据: {:?}", store.dir());
            println!("  Generator = {}", versions.generator);
            println!(
                "  MinimumCompatibleClientVersion = {:?}",
                versions.minimum_compatible_client_version
            );
            println!("  WorldVersion = {}", versions.world_version);
            println!("  InventoryVersion = {}", versions.inventory_version);
            println!("  StorageVersion = {}", versions.storage_version);
            println!("  NetworkVersion = {}", versions.network_version);
        }

        Commands::Config { output, force } => {
            if output.exists() && !force {
                anyhow::bail!("文件已存在: {:?}\n使用 --force 覆盖", output);
            }

            let default_config = Config::default();
            default_config.save_to_file(&output)?;
            println!("已生成配置文件: {:?}", output);
            println!("\n配置项说明:");
            println!("  [convert]");
            println!("    scratch_dir = \"...\"       # 临时目录根，默认使用系统临时目录");
            println!("    duplicate_identifiers = \"reject\"  # 或 \"last_wins\"");
            println!(
                "    output_dir = {:?}          # 输出目录",
                default_config.convert.output_dir
            );
            println!("  [assets]");
            println!("    pack_icon = \"...\"         # 覆盖内置行为包图标");
            println!("    world_icon = \"...\"        # 覆盖内置世界图标");
            println!("    first_load_function = \"...\"  # 首次加载时执行的函数");
            println!("    level_template = \"...\"    # 参考 level.dat");
            println!("  [calibration]");
            println!(
                "    dir = {:?}  # 校准数据目录",
                default_config.calibration.dir
            );
        }
    }

    Ok(())
}
