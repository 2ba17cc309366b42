use std::path::Path;

use ela_detect::{DetectorConfig, TamperingDetector, error::Result, report::ErrorReport};

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let image_path = args.next().unwrap_or_else(|| "evidences/spliced.jpg".into());

    let config = match args.next() {
        Some(config_path) => DetectorConfig::from_json_file(config_path)?,
        None => DetectorConfig::default(),
    };

    let detector = TamperingDetector::new(config)?;
    detector.start()?;

    let path = Path::new(&image_path);
    let bytes = std::fs::read(path)?;

    match detector.predict_tampering(&bytes, content_type_for(path)) {
        Ok(result) => {
            println!("{}", result.to_json()?);
            println!("{}", result.prediction.recommendation());
        }
        Err(e) => {
            eprintln!("{}", ErrorReport::from(&e).to_json()?);
        }
    }

    println!("{}", detector.health().to_json()?);

    Ok(())
}
