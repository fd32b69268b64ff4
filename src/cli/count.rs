// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::Path;
use std::time::Instant;

use crate::cli::args::CountArgs;
use crate::cli::logging::set_verbose;
use crate::counter::{self, DetectionCount};
use crate::error::Result;
use crate::run_log::RunLog;
use crate::source::{is_image_file, load_image};
use crate::{CounterConfig, VERSION, YoloModel};
use crate::{section, verbose, warn};

/// Run the `count` command.
///
/// The model is loaded first, so a bad model path fails before the image is
/// read or the log is touched. On success each count is printed to stdout
/// as `"<count> <class_name>"` and one summary line is appended to the log.
///
/// # Errors
///
/// Returns the first error hit while loading the model, decoding the image,
/// running inference, or writing the log.
pub fn run_count(args: &CountArgs) -> Result<Vec<DetectionCount>> {
    set_verbose(args.verbose);

    let mut config = CounterConfig::new()
        .with_confidence(args.conf)
        .with_iou(args.iou)
        .with_max_detections(args.max_det)
        .with_threads(args.threads)
        .with_half(args.half);
    if let Some(sz) = args.imgsz {
        config = config.with_imgsz(sz, sz);
    }

    section!("detection-counter {VERSION}");
    let mut model = YoloModel::load_with_config(&args.model, config)?;

    let imgsz = model.imgsz();
    verbose!(
        "{} summary ({}): {} classes, imgsz=({}, {}), stride={}, {}",
        model.metadata().model_name(),
        model.model_path().display(),
        model.num_classes(),
        imgsz.0,
        imgsz.1,
        model.stride(),
        if model.is_half() { "FP16" } else { "FP32" }
    );

    if !is_image_file(Path::new(&args.source)) {
        warn!(
            "'{}' has no known image extension, decoding by content",
            args.source
        );
    }
    let image = load_image(&args.source)?;

    let mut log = RunLog::open(&args.log)?;

    let start = Instant::now();
    let counts = counter::run(&image, &mut model)?;
    verbose!(
        "{}: {}x{} {}, {:.1}ms",
        args.source,
        image.height(),
        image.width(),
        counter::summarize(&counts),
        start.elapsed().as_secs_f64() * 1000.0
    );

    for entry in &counts {
        println!("{entry}");
    }

    log.record(&args.source, &counts)?;
    verbose!("Results logged to {}", log.path().display());

    Ok(counts)
}
