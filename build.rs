use std::{
    fs,
    io::{self, ErrorKind, Write},
    process::Command,
};

// written next to their sources, where the default config looks for them
const SHADERS: [(&str, &str); 2] = [
    ("shaders/shader.vert", "shaders/vert.spv"),
    ("shaders/shader.frag", "shaders/frag.spv"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=shaders/");

    fs::create_dir_all("shaders")?;

    for (source, output) in SHADERS {
        let result = match Command::new("glslc").arg(source).arg("-o").arg(output).output() {
            Ok(result) => result,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                println!("cargo:warning=glslc not found, {output} was not rebuilt");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        io::stdout().write_all(&result.stdout)?;
        io::stderr().write_all(&result.stderr)?;
        if !result.status.success() {
            return Err(format!("glslc failed on {source}").into());
        }
    }

    Ok(())
}
