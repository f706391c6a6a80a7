use chrono::Utc;
use clap::{Parser, Subcommand};
use fmdl_utils_cli::importer::{geometry_from_mesh, load_obj_meshes};
use fmdl_utils_cli::material::DirectoryTextureSource;
use fmdl_utils_cli::obj::model_to_obj_bytes;
use fmdl_utils_cli::{CodecSession, FmdlModel, ModelKind, ToolConfig, resolve_materials};
use log::{info, warn};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// JSON file with default settings; flags override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of an FMDL file.
    Info {
        input: PathBuf,
        /// Also dump every decoded table as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    FmdlToObj {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum)]
        kind: Option<ModelKind>,
    },
    /// Replace the geometry of a template FMDL with the objects of an OBJ.
    ObjToFmdl {
        template: PathBuf,
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum)]
        kind: Option<ModelKind>,
    },
    /// Decode and re-encode without changes.
    Roundtrip {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum)]
        kind: Option<ModelKind>,
    },
    /// Show which materials and textures each submesh uses.
    Materials {
        input: PathBuf,
        #[arg(long)]
        texture_dir: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn open_session(config: &ToolConfig, kind: Option<ModelKind>, input: &Path) -> Result<CodecSession, Box<dyn Error>> {
    let (kind, codec) = config.codec(kind);
    let mut session = CodecSession::new(kind, codec);
    session.import(input)?;
    Ok(session)
}

fn loaded(session: &CodecSession) -> Result<&FmdlModel, Box<dyn Error>> {
    session.model().ok_or_else(|| "no model loaded".into())
}

fn print_info(model: &FmdlModel) {
    println!("version {}", model.version);
    println!(
        "section 0 blocks: {:?}",
        model.section0_blocks.iter().collect::<Vec<_>>()
    );
    println!(
        "{} bones, {} bone groups, {} materials, {} textures, {} strings",
        model.bones.len(),
        model.bone_groups.len(),
        model.material_instances.len(),
        model.textures.len(),
        model.strings.len()
    );
    for (index, (object, submesh)) in model.objects.iter().zip(&model.submeshes).enumerate() {
        println!(
            "submesh {}: {} vertices, {} triangles, faces from {}, material {}, bone group {}",
            index,
            object.vertex_count,
            submesh.triangles.len(),
            object.first_face_vertex_id,
            object.material_instance_id,
            object.bone_group_id
        );
    }
}

fn obj_to_fmdl(session: &mut CodecSession, obj_data: &[u8]) -> Result<(), Box<dyn Error>> {
    let meshes = load_obj_meshes(obj_data)?;
    let submesh_count = loaded(session)?.submeshes.len();
    if meshes.len() != submesh_count {
        warn!(
            "obj has {} objects but the template has {} submeshes, replacing the first {}",
            meshes.len(),
            submesh_count,
            meshes.len().min(submesh_count)
        );
    }

    for (index, mesh) in meshes.iter().enumerate().take(submesh_count) {
        let template = &loaded(session)?.submeshes[index];
        let geometry = geometry_from_mesh(mesh, template, index)?;
        info!(
            "{} -> submesh {}: {} vertices, {} triangles",
            mesh.name,
            index,
            geometry.vertex_count(),
            geometry.triangles.len()
        );
        session.replace_geometry(index, geometry)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };

    let start = Utc::now();
    match cli.command {
        Commands::Info { input, json } => {
            let session = open_session(&config, None, &input)?;
            let model = loaded(&session)?;
            print_info(model);
            if let Some(path) = json {
                fs::write(path, serde_json::to_vec_pretty(model)?)?;
            }
        }
        Commands::FmdlToObj { input, output, kind } => {
            let session = open_session(&config, kind, &input)?;
            let bytes = model_to_obj_bytes(loaded(&session)?, session.kind())?;
            fs::write(output, bytes)?;
        }
        Commands::ObjToFmdl {
            template,
            input,
            output,
            kind,
        } => {
            let mut session = open_session(&config, kind, &template)?;
            let obj_data = fs::read(input)?;
            obj_to_fmdl(&mut session, &obj_data)?;
            session.export(&output)?;
        }
        Commands::Roundtrip { input, output, kind } => {
            let session = open_session(&config, kind, &input)?;
            session.export(&output)?;
        }
        Commands::Materials {
            input,
            texture_dir,
            json,
        } => {
            let session = open_session(&config, None, &input)?;
            let mut report = resolve_materials(loaded(&session)?);
            if let Some(root) = texture_dir.or_else(|| config.texture_dir.clone()) {
                report.locate_images(&DirectoryTextureSource::new(root, config.texture_extension()));
            }
            for assignment in &report.assignments {
                println!(
                    "{}: material '{}' (instance {})",
                    session.kind().submesh_name(assignment.submesh),
                    assignment.material_name,
                    assignment.material_instance
                );
                for texture in &assignment.textures {
                    let image = match &texture.image {
                        Some(path) => path.display().to_string(),
                        None => "-".to_string(),
                    };
                    println!("\t{} : {} [{}]", texture.parameter, texture.path(), image);
                }
            }
            if let Some(path) = json {
                fs::write(path, serde_json::to_vec_pretty(&report)?)?;
            }
        }
    }
    let elapsed = Utc::now().signed_duration_since(start);
    println!("done in {} ms", elapsed.num_milliseconds());
    Ok(())
}
