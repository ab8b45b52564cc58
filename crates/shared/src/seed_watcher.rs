//! 种子文件热加载模块
//!
//! 使用 `notify` 监听种子文件所在目录，文件写入后经 debounce 窗口去抖，
//! 再调用服务提供的重载回调。回调负责解析种子并原子替换快照，
//! 回调失败时保留旧快照。
//!
//! ```text
//! notify 事件 ──mpsc──▶ debounce 循环 ──▶ reload(path)
//!                              ▲
//!                     shutdown watch channel
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::config::SeedConfig;
use crate::observability::metrics;

/// 重载回调
pub type ReloadFn = Arc<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// 基于文件系统事件的种子监听器
pub struct SeedFileWatcher {
    path: PathBuf,
    debounce: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SeedFileWatcher {
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            path: path.as_ref().to_path_buf(),
            debounce,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// 按种子配置构建；未配置路径或未开启监听时返回 None
    pub fn from_config(config: &SeedConfig) -> Option<Self> {
        match (&config.path, config.watch) {
            (Some(path), true) => Some(Self::new(path, Duration::from_millis(config.debounce_ms))),
            _ => None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 启动监听
    ///
    /// 监听的是父目录：编辑器通常以 rename 方式保存，直接监听文件会丢失后续事件。
    pub fn start(&self, reload: ReloadFn) -> Result<()> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .context("种子文件路径缺少文件名")?;
        let watch_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, mut event_rx) = mpsc::channel::<()>(16);

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if relevant {
                        let _ = event_tx.try_send(());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "文件监听器事件错误");
                }
            })
            .context("创建文件监听器失败")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .context("启动文件监听失败")?;

        info!(path = %self.path.display(), "种子文件监听已启动");

        let path = self.path.clone();
        let debounce = self.debounce;
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            // watcher 随任务存活，任务结束即停止监听
            let _watcher = watcher;
            loop {
                tokio::select! {
                    Some(()) = event_rx.recv() => {
                        tokio::time::sleep(debounce).await;
                        while event_rx.try_recv().is_ok() {}

                        match reload(&path) {
                            Ok(()) => {
                                metrics::record_seed_reload("success");
                                info!(path = %path.display(), "种子文件变更，快照已替换");
                            }
                            Err(e) => {
                                metrics::record_seed_reload("failed");
                                error!(
                                    path = %path.display(),
                                    error = %e,
                                    "种子文件重新加载失败，保留当前快照"
                                );
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("种子文件监听已停止");
                            break;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    /// 停止监听
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_from_config_requires_path_and_watch() {
        let mut config = SeedConfig::default();
        assert!(SeedFileWatcher::from_config(&config).is_none());

        config.path = Some("seed.json".to_string());
        assert!(SeedFileWatcher::from_config(&config).is_none());

        config.watch = true;
        let watcher = SeedFileWatcher::from_config(&config).unwrap();
        assert_eq!(watcher.path(), Path::new("seed.json"));
    }

    #[tokio::test]
    async fn test_reload_called_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "{}").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let watcher = SeedFileWatcher::new(&path, Duration::from_millis(20));
        watcher
            .start(Arc::new({
                let calls = calls.clone();
                move |_: &Path| -> Result<()> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }))
            .unwrap();

        // 给后端一点时间完成注册
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, r#"{"subscribers": []}"#).unwrap();

        let mut waited = 0;
        while calls.load(Ordering::SeqCst) == 0 && waited < 50 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            waited += 1;
        }
        watcher.stop();

        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "{}").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let watcher = SeedFileWatcher::new(&path, Duration::from_millis(10));
        watcher
            .start(Arc::new({
                let calls = calls.clone();
                move |_: &Path| -> Result<()> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("bad seed")
                }
            }))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, "broken").unwrap();
        let mut waited = 0;
        while calls.load(Ordering::SeqCst) == 0 && waited < 50 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            waited += 1;
        }
        let first = calls.load(Ordering::SeqCst);
        assert!(first >= 1);

        // 第二次写入仍会触发回调
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(&path, "still broken").unwrap();
        waited = 0;
        while calls.load(Ordering::SeqCst) == first && waited < 50 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            waited += 1;
        }
        watcher.stop();

        assert!(calls.load(Ordering::SeqCst) > first);
    }
}
