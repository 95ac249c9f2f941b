use clap::{Parser, ValueEnum};
use fantasy_mapgen::{GenerationConfig, MapStyle, WorldFile, generate, render_map};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    Parchment,
    Color,
}

impl From<StyleArg> for MapStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Parchment => MapStyle::Parchment,
            StyleArg::Color => MapStyle::Color,
        }
    }
}

/// Генератор фэнтезийных карт
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сид генерации (перекрывает значение из конфигурации)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Стиль оформления (перекрывает значение из конфигурации)
    #[arg(long, value_enum)]
    style: Option<StyleArg>,

    /// Путь для сохранения карты (по умолчанию: ./map.png)
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Сохранить объекты карты в JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Сохранить карту высот в оттенках серого
    #[arg(long)]
    heightmap: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut world = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации...");
            WorldFile::from_toml_file(path)?
        }
        None => WorldFile {
            seed: 0,
            config: GenerationConfig::default(),
        },
    };
    if let Some(seed) = cli.seed {
        world.seed = seed;
    }
    if let Some(style) = cli.style {
        world.config.style = style.into();
    }

    println!(
        "Генерация карты (сид: {}, размер: {}×{})...",
        world.seed, world.config.width, world.config.height
    );
    let map = generate(world.seed, &world.config)?;
    println!(
        "Городов: {}, рек: {}, дорог: {}, подписей: {}",
        map.settlements.len(),
        map.rivers.len(),
        map.roads.edges.len(),
        map.labels.len()
    );

    println!("Сохранение в {:?}", cli.output);
    render_map(&map).save(&cli.output)?;

    if let Some(path) = &cli.json {
        println!("Экспорт объектов в {path:?}");
        fs::write(path, serde_json::to_string_pretty(&map)?)?;
    }

    if let Some(path) = &cli.heightmap {
        println!("Сохранение карты высот в {path:?}");
        map.elevation
            .save_as_png(path.to_str().ok_or("heightmap path is not valid UTF-8")?)?;
    }

    println!("\nГотово! Карта сохранена.");
    Ok(())
}
