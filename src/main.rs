use clap::Parser;
use log::{error, info, warn};
use mt_rasterizer::core::renderer::Renderer;
use mt_rasterizer::geometry::camera::CameraProvider;
use mt_rasterizer::io::args::Args;
use mt_rasterizer::io::config_loader::TomlConfigLoader;
use mt_rasterizer::io::mesh::{Mesh, MeshProvider};
use mt_rasterizer::io::obj_loader::load_obj_model;
use mt_rasterizer::io::render_settings::RenderSettings;
use mt_rasterizer::material_system::texture::{Texture, TextureProvider};
use mt_rasterizer::utils::image_utils::{output_basename, save_render_outputs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// 加载贴图，失败时只记录警告
fn load_texture(path: &Path, role: &str) -> Option<Arc<dyn TextureProvider>> {
    match Texture::from_file(path) {
        Ok(texture) => Some(Arc::new(texture)),
        Err(e) => {
            warn!("{}贴图 {:?} 加载失败: {}", role, path, e);
            None
        }
    }
}

/// 命令行路径优先于 MTL 中的路径
fn pick_texture(explicit: Option<&String>, from_mtl: Option<PathBuf>) -> Option<PathBuf> {
    explicit.map(PathBuf::from).or(from_mtl)
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(path) = &args.write_example_config {
        TomlConfigLoader::create_example_config(path)?;
        info!("示例配置已写入 {}", path);
        return Ok(());
    }

    let mut settings = match &args.config {
        Some(path) => TomlConfigLoader::load_from_file(path)?,
        None => RenderSettings::default(),
    };
    args.apply_to(&mut settings);
    settings.validate()?;

    // 网格与贴图
    let (mesh, mtl_textures) = match &settings.files.obj {
        Some(obj) => {
            let loaded = load_obj_model(obj).map_err(|e| e.to_string())?;
            let textures = (
                loaded.diffuse_texture,
                loaded.normal_texture,
                loaded.specular_texture,
            );
            (loaded.mesh, textures)
        }
        None => {
            info!("未指定 OBJ 文件，渲染内置立方体");
            (Mesh::cube(2.0), (None, None, None))
        }
    };
    let mesh: Arc<dyn MeshProvider> = Arc::new(mesh);

    let mut config = settings.to_render_config()?;
    let files = &settings.files;
    config.material.diffuse_map = pick_texture(files.diffuse_texture.as_ref(), mtl_textures.0)
        .and_then(|p| load_texture(&p, "漫反射"));
    config.material.normal_map = pick_texture(files.normal_texture.as_ref(), mtl_textures.1)
        .and_then(|p| load_texture(&p, "法线"));
    config.material.specular_map = pick_texture(files.specular_texture.as_ref(), mtl_textures.2)
        .and_then(|p| load_texture(&p, "高光"));

    let lock_strategy = settings.lock_strategy()?;
    let mut renderer = Renderer::new(
        settings.render.width,
        settings.render.height,
        settings.thread_count(),
        lock_strategy,
    )
    .map_err(|e| e.to_string())?;
    let mut camera = settings.orbit_camera()?;

    info!(
        "开始渲染: {}x{}, {} 个线程, {}, 填充 {}, {} 帧",
        renderer.width(),
        renderer.height(),
        renderer.thread_count(),
        config.get_mode_description(),
        config.fill,
        settings.render.frames
    );

    let output_dir = Path::new(&settings.files.output_dir);
    let basename = output_basename(settings.files.output.as_deref());
    let frames = settings.render.frames;
    let start = Instant::now();
    let mut failed_frames = 0;

    for frame in 0..frames {
        let report = renderer
            .render(&mesh, &camera, &config)
            .map_err(|e| e.to_string())?;
        if !report.is_ok() {
            failed_frames += 1;
            for failure in &report.failures {
                error!("第 {} 帧任务 {} 失败: {}", frame, failure.task, failure.message);
            }
        }
        info!(
            "帧 {}/{}: 相机 {:?}, 绘制 {} 个三角形, 写入 {} 个片元, 耗时 {:?}",
            frame + 1,
            frames,
            camera.eye(),
            report.stats.faces_drawn,
            report.stats.fragments_written,
            report.transform_time + report.raster_time
        );

        camera.rotate(settings.camera.orbit_step.to_radians(), 0.0);
    }

    let elapsed = start.elapsed();
    save_render_outputs(&renderer, output_dir, &basename, settings.files.save_depth)
        .map_err(|e| e.to_string())?;
    info!(
        "渲染完成: {} 帧, 总耗时 {:?}, 平均 {:.1} fps",
        frames,
        elapsed,
        frames as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    if failed_frames > 0 {
        return Err(format!("{} 帧渲染存在失败的任务", failed_frames));
    }
    Ok(())
}
