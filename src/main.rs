use anyhow::Result;
use exam_shuffle::utils::logging;
use exam_shuffle::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：默认值 → 配置文件 → 环境变量 → 命令行参数
    let config = Config::load()?.with_args(std::env::args().skip(1))?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let _summary = App::initialize(config).await?.run().await?;

    Ok(())
}
