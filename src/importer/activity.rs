// ==========================================
// 仓储资产导入引擎 - 导入进行中标志
// ==========================================
// 职责: 导入期间抑制实时刷新（由调用方持有并传给刷新协作方）
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 可克隆的“导入进行中”标志
#[derive(Debug, Clone, Default)]
pub struct ImportActivity {
    active: Arc<AtomicBool>,
}

impl ImportActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// 标记导入开始；守卫释放时自动复位
    ///
    /// # 返回
    /// - None: 已有导入在进行
    pub fn begin(&self) -> Option<ImportActivityGuard> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| ImportActivityGuard {
                active: Arc::clone(&self.active),
            })
    }
}

#[derive(Debug)]
pub struct ImportActivityGuard {
    active: Arc<AtomicBool>,
}

impl Drop for ImportActivityGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_resets_flag() {
        let activity = ImportActivity::new();
        let observer = activity.clone();
        {
            let _guard = activity.begin().unwrap();
            assert!(observer.is_active());
            assert!(activity.begin().is_none());
        }
        assert!(!observer.is_active());
        assert!(activity.begin().is_some());
    }
}
