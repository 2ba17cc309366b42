use ela_detect::{ElaAnalyzer, error::Result};

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "evidences/spliced.jpg".into());
    let image = image::open(&path).map_err(ela_detect::error::ForensicsError::Decode)?;
    std::fs::create_dir_all("output")?;

    for quality in [95, 91, 85] {
        println!("Analyzing {} at quality {}... ", path, quality);

        let ela_result = ElaAnalyzer::new(quality).analyze(&image)?;

        let ela_output = format!("output/ela_q{}.png", quality);
        ela_result.save(&ela_output)?;

        println!("  Max difference: {}", ela_result.max_difference);
        println!("  Mean difference: {:.2}", ela_result.mean_difference);
        println!("  Scale: {:.2}", ela_result.scale);
        println!("  Output: {}", ela_output);
        println!();
    }

    Ok(())
}
