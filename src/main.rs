use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use prompt_world::cli::{Cli, Command};
use prompt_world::describe::StaticDescriber;
use prompt_world::export::{export_file_name, import_scene, write_document};
use prompt_world::math::compose_object_transform;
use prompt_world::prompt::{compose_prompt, world_context_json, CannedAnswers};
use prompt_world::script::GestureScript;
use prompt_world::{Editor, EditorConfig, FileSceneStore, ImagePayload, PlaneId, Scene, SceneId, SceneStore};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let mut store = FileSceneStore::open(&cli.store)
        .with_context(|| format!("Failed to open scene store at {}", cli.store.display()))?;

    match cli.command {
        Command::New { name } => {
            let editor = Editor::create(name, store, config);
            finish(editor)?;
        }
        Command::List => {
            let scenes = store.load_all().context("Failed to list scenes")?;
            if scenes.is_empty() {
                println!("No scenes in {}", cli.store.display());
            }
            for summary in scenes {
                println!(
                    "{}  {:<24} {} plane(s)  created {}",
                    summary.id,
                    summary.name,
                    summary.object_count,
                    summary.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Show { scene } => {
            let scene = load(&store, &scene)?;
            print_scene(&scene);
        }
        Command::ImportImage { scene, images } => {
            let mut editor = open(store, &scene, config)?;
            for path in images {
                let payload = read_image(&path)?;
                if payload.dimensions().is_none() {
                    log::warn!("{} could not be decoded; keeping raw bytes", path.display());
                }
                let id = editor.import_image(payload);
                println!("Imported {} as plane {}", path.display(), id.short());
            }
            finish(editor)?;
        }
        Command::Replay { scene, script } => {
            let text = fs::read_to_string(&script).with_context(|| format!("Failed to read {}", script.display()))?;
            let script: GestureScript = text.parse().with_context(|| format!("Invalid script {}", script.display()))?;
            let mut editor = open(store, &scene, config)?;
            let summary = script.run(&mut editor);
            editor.flush();
            println!(
                "Replayed {} step(s): {} commit(s), {} redraw(s)",
                summary.steps, summary.commits, summary.redraws
            );
            finish(editor)?;
        }
        Command::Describe {
            scene,
            descriptions,
            planes,
        } => {
            let describer = StaticDescriber::from_file(&descriptions)?;
            let mut editor = open(store, &scene, config)?;
            let ids = planes
                .iter()
                .map(|key| find_plane(editor.scene(), key))
                .collect::<Result<Vec<_>>>()?;
            let report = if ids.is_empty() {
                pollster::block_on(editor.describe_all(&describer))
            } else {
                pollster::block_on(editor.describe(&ids, &describer))
            };
            println!("{}", report.summary());
            finish(editor)?;
        }
        Command::SetDescription { scene, plane, text } => {
            let mut editor = open(store, &scene, config)?;
            let id = find_plane(editor.scene(), &plane)?;
            if editor.set_description(&id, &text) {
                println!("Updated description of plane {}", id.short());
            } else {
                println!("Description of plane {} unchanged", id.short());
            }
            finish(editor)?;
        }
        Command::Context { scene, query } => {
            let scene = load(&store, &scene)?;
            match query {
                Some(query) => println!("{}", compose_prompt(&scene, &query)?),
                None => println!("{}", world_context_json(&scene)?),
            }
        }
        Command::Ask { scene, answers, query } => {
            let answers = CannedAnswers::from_file(&answers)?;
            let editor = open(store, &scene, config)?;
            match pollster::block_on(editor.ask(&query, &answers)) {
                Ok(answer) => println!("{answer}"),
                Err(e) if e.is_warning() => println!("{e}"),
                Err(e) => bail!("{e}"),
            }
        }
        Command::Export { scene, output } => {
            let scene = load(&store, &scene)?;
            let output = output.unwrap_or_else(|| export_file_name(&scene.name).into());
            let file = File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?;
            write_document(&scene, BufWriter::new(file))?;
            println!("Exported \"{}\" to {}", scene.name, output.display());
        }
        Command::Import { file } => {
            let text = fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let scene = import_scene(&text).with_context(|| format!("Failed to import {}", file.display()))?;
            pollster::block_on(store.save(&scene)).context("Failed to save imported scene")?;
            println!("Imported \"{}\" as scene {}", scene.name, scene.id());
        }
        Command::Delete { scene } => {
            store.delete(&SceneId::from(scene.as_str()))?;
            println!("Deleted scene {scene}");
        }
    }

    Ok(())
}

fn load(store: &FileSceneStore, id: &str) -> Result<Scene> {
    store
        .load(&SceneId::from(id))
        .with_context(|| format!("Failed to load scene {id}"))
}

fn open(store: FileSceneStore, id: &str, config: EditorConfig) -> Result<Editor<FileSceneStore>> {
    Editor::open(store, &SceneId::from(id), config).with_context(|| format!("Failed to open scene {id}"))
}

/// Wait for queued saves, then print notices; a scene that never reached the store is an error
fn finish(mut editor: Editor<FileSceneStore>) -> Result<()> {
    pollster::block_on(editor.drain_saves());
    let notices = editor.take_notices();
    for notice in &notices {
        eprintln!("{notice}");
    }
    if editor.is_dirty() {
        bail!("scene {} has unsaved changes", editor.scene().id());
    }
    println!("Scene {} \"{}\"", editor.scene().id(), editor.scene().name);
    Ok(())
}

fn read_image(path: &Path) -> Result<ImagePayload> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    let Some(mime) = ImagePayload::mime_for_extension(extension) else {
        bail!("{} is not a supported image type", path.display());
    };
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ImagePayload::new(mime, bytes))
}

/// Full id or its short (trailing) form
fn find_plane(scene: &Scene, key: &str) -> Result<PlaneId> {
    let matches: Vec<&PlaneId> = scene
        .objects()
        .iter()
        .map(|plane| plane.id())
        .filter(|id| id.as_str() == key || id.short() == key)
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("no plane `{key}` in scene {}", scene.id()),
        _ => bail!("plane key `{key}` is ambiguous in scene {}", scene.id()),
    }
}

fn print_scene(scene: &Scene) {
    let camera = scene.camera();
    println!("{} \"{}\"", scene.id(), scene.name);
    println!(
        "  camera: pan ({}, {}) zoom {}",
        camera.pan_x,
        camera.pan_y,
        camera.zoom()
    );
    for (index, plane) in scene.objects().iter().enumerate() {
        let size = plane
            .image()
            .dimensions()
            .map(|[w, h]| format!("{w}x{h}"))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  [{index}] {} {} {size}  {}",
            plane.id().short(),
            plane.image().mime_type(),
            compose_object_transform(plane)
        );
        if !plane.description.is_empty() {
            println!("      {}", plane.description);
        }
    }
}
