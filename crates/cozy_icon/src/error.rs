use miette::Diagnostic;

#[derive(Diagnostic, Debug, thiserror::Error)]
#[diagnostic()]
pub enum IconError {
    #[error("invalid icon config: {0}")]
    #[diagnostic(code(icon_error::invalid_config))]
    InvalidConfig(String),
    #[error("failed to parse font: {0}")]
    #[diagnostic(code(icon_error::invalid_font))]
    InvalidFont(String),
    #[error("failed to read font file {path:?}")]
    #[diagnostic(code(icon_error::font_io))]
    FontIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to allocate a {width}x{height} canvas")]
    #[diagnostic(code(icon_error::canvas))]
    CanvasAllocation { width: u32, height: u32 },
    #[error("png encode error")]
    #[diagnostic(code(icon_error::png))]
    Png(#[from] image::ImageError),
}
