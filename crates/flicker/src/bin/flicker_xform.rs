use std::path::PathBuf;
use std::sync::Arc;

use argh::FromArgs;
use flicker::{
    align::{Landmark, LandmarkTable},
    image::{
        packed::{broadcast_gray, gray_from_raster},
        GrayImage, Raster,
    },
    imgproc::threshold::SliceMode,
    EngineConfig, ImageSide, MemoryImageStore, SessionContext, Target, TransformOp,
    TransformOrchestrator, TransformParams,
};

/// Apply one transform to a raw 8-bit gray image
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the raw input, width * height bytes
    #[argh(positional)]
    input: PathBuf,

    /// path of the raw output
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// image width in pixels
    #[argh(option)]
    width: usize,

    /// image height in pixels
    #[argh(option)]
    height: usize,

    /// operation name, e.g. Gradient, Threshold, AffineWarp or plugin:<slot>
    #[argh(option, short = 'x', from_str_fn(parse_op))]
    op: TransformOp,

    /// side to transform: left, right or both
    #[argh(option, default = "Target::Right", from_str_fn(parse_target))]
    target: Target,

    /// optional second raw image loaded on the left side
    #[argh(option)]
    left: Option<PathBuf>,

    /// landmarks as `x1,y1,x2,y2;...` (image 1 then image 2 coordinates)
    #[argh(option, from_str_fn(parse_landmarks))]
    landmarks: Option<LandmarkTable>,

    /// engine configuration as JSON
    #[argh(option)]
    config: Option<PathBuf>,

    /// pseudo-3D angle in degrees
    #[argh(option, default = "0.0")]
    angle: f64,

    /// pseudo-3D lift in percent
    #[argh(option, default = "0")]
    z_scale: u8,

    /// sharpening weight in percent
    #[argh(option, default = "50")]
    e_scale: u8,

    /// lower threshold
    #[argh(option, default = "0")]
    t1: u8,

    /// upper threshold
    #[argh(option, default = "255")]
    t2: u8,

    /// clear the inside of the threshold range instead of the outside
    #[argh(switch)]
    inside: bool,

    /// zoom magnification
    #[argh(option, default = "1.0")]
    zoom: f64,

    /// swap the image roles when solving landmark warps
    #[argh(switch)]
    flip: bool,

    /// the data is black-is-zero
    #[argh(switch)]
    black_is_zero: bool,
}

fn parse_op(value: &str) -> Result<TransformOp, String> {
    value.parse().map_err(|e: flicker::TransformError| e.to_string())
}

fn parse_target(value: &str) -> Result<Target, String> {
    value.parse().map_err(|e: flicker::TransformError| e.to_string())
}

fn parse_landmarks(value: &str) -> Result<LandmarkTable, String> {
    let mut table = LandmarkTable::default();
    for item in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let coords = item
            .split(',')
            .map(|v| v.trim().parse::<f64>().map_err(|e| format!("`{v}`: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        let [x1, y1, x2, y2] = coords[..] else {
            return Err(format!("landmark `{item}` must have 4 coordinates"));
        };
        table.push(Landmark::new([x1, y1], [x2, y2]));
    }
    Ok(table)
}

fn read_raw(
    path: &PathBuf,
    width: usize,
    height: usize,
) -> Result<Raster, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let gray = GrayImage::new([width, height].into(), bytes)?;
    let mut raster = Raster::try_from_size_val(gray.size(), 0)?;
    broadcast_gray(&gray, &mut raster)?;
    Ok(raster)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    let right = read_raw(&args.input, args.width, args.height)?;
    let left = match &args.left {
        Some(path) => read_raw(path, args.width, args.height)?,
        None => right.clone(),
    };

    let store = Arc::new(MemoryImageStore::default());
    store.load(ImageSide::Left, left, args.black_is_zero);
    store.load(ImageSide::Right, right, args.black_is_zero);

    let mut ctx = SessionContext::new(config);
    if let Some(table) = args.landmarks {
        ctx.set_landmarks(table);
    }

    let params = TransformParams {
        angle_deg: args.angle,
        z_scale: args.z_scale,
        e_scale: args.e_scale,
        threshold1: args.t1,
        threshold2: args.t2,
        slice_mode: if args.inside {
            SliceMode::Inside
        } else {
            SliceMode::Outside
        },
        zoom_mag: args.zoom,
        flip_landmarks: args.flip,
    };

    let orchestrator = TransformOrchestrator::new(ctx, store.clone(), store.clone());
    let report = orchestrator.run_blocking(args.op, args.target, &params)?;

    let side = match args.target {
        Target::Left => ImageSide::Left,
        Target::Right | Target::Both => ImageSide::Right,
    };
    let output = store
        .current(side)
        .ok_or(flicker::TransformError::NoImage(side))?;
    std::fs::write(&args.output, gray_from_raster(&output)?.into_vec())?;

    log::info!(
        "{} -> {}x{} written to {} in {:?}",
        report.op,
        output.width(),
        output.height(),
        args.output.display(),
        report.elapsed
    );

    Ok(())
}
