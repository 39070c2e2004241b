//! `eru image build` command: build an image on the Eru core.
//!
//! Loads a multi-stage spec (or packs a directory with `--raw`), submits it
//! to the build service and renders the streamed progress on stdout.

use clap::Args;

use eru_image_core::{
    AnsiTerminal, BuildParams, ClientConfig, GrpcBuildService, RequestBuilder, Result,
    StreamDispatcher,
};

#[derive(Args)]
pub struct BuildArgs {
    /// Spec file path or URL (build directory with --raw)
    #[arg(value_name = "SPEC")]
    pub spec: Option<String>,

    /// Name of the image
    #[arg(long)]
    pub name: Option<String>,

    /// Tag of the image, can be repeated [default: latest]
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Build the image from a directory instead of a spec
    #[arg(long)]
    pub raw: bool,

    /// User of the image [server default: root]
    #[arg(long, default_value = "")]
    pub user: String,

    /// UID of the image [server default: 1]
    #[arg(long, default_value_t = 0)]
    pub uid: i32,
}

impl From<BuildArgs> for BuildParams {
    fn from(args: BuildArgs) -> Self {
        BuildParams {
            source: args.spec,
            name: args.name.unwrap_or_default(),
            tags: args.tags,
            user: args.user,
            uid: args.uid,
            raw: args.raw,
        }
    }
}

pub async fn execute(args: BuildArgs, config: ClientConfig) -> Result<()> {
    // Validate and load everything before touching the network
    let request = RequestBuilder::default().build(args.into()).await?;
    tracing::debug!(endpoint = %config.endpoint, mode = ?request.mode(), "Connecting to Eru core");

    let mut service = GrpcBuildService::connect(&config).await?;
    let mut dispatcher = StreamDispatcher::new(AnsiTerminal::stdout());
    dispatcher.run(&mut service, request).await
}
