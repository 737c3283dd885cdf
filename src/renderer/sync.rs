//! GPU 同步机制模块
//!
//! CPU 侧的 Fence 值记账。原生 Fence 的 Signal / 等待由 DX12 后端完成，
//! 这里只负责决定"下一个要 Signal 的值"以及"是否需要阻塞等待"。
//!
//! # 每帧流程
//!
//! ```text
//! ExecuteCommandLists → Present → Signal(next_value) → completed < value ? 等待事件 : 继续
//! ```
//!
//! 每一帧都会等待 GPU 完成，交换链的双缓冲并没有被用来重叠 CPU 和 GPU 工作。

/// Fence 值
///
/// 单调递增，GPU 完成某次提交后 Fence 的完成值会到达对应的值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FenceValue(u64);

impl FenceValue {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Fence 管理器
///
/// 原生 Fence 以 0 创建，第一次 Signal 的值为 1。
#[derive(Debug, Default)]
pub struct FenceManager {
    /// 最近一次 Signal 的值（CPU 侧）
    last_signaled: FenceValue,
    /// 已知的完成值（GPU 侧）
    completed: FenceValue,
}

impl FenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次 Signal 的值
    pub fn last_signaled(&self) -> FenceValue {
        self.last_signaled
    }

    /// 获取下一个要 Signal 的值并记录
    pub fn next_value(&mut self) -> FenceValue {
        self.last_signaled = self.last_signaled.next();
        self.last_signaled
    }

    /// 记录从原生 Fence 读到的完成值
    ///
    /// 完成值只会前进，读到的旧值会被忽略。
    pub fn update_completed_value(&mut self, value: FenceValue) {
        if value > self.completed {
            self.completed = value;
        }
    }

    /// 检查特定 Fence 值是否已完成
    pub fn is_completed(&self, value: FenceValue) -> bool {
        self.completed >= value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_value() {
        let fence = FenceValue::new(0);
        assert_eq!(fence.value(), 0);
        assert_eq!(fence.next().value(), 1);
        assert_eq!(fence.value(), 0);
    }

    #[test]
    fn test_fence_manager_monotonic() {
        let mut manager = FenceManager::new();
        assert_eq!(manager.last_signaled().value(), 0);
        assert!(manager.is_completed(manager.last_signaled()));

        let v1 = manager.next_value();
        let v2 = manager.next_value();
        assert_eq!(v1.value(), 1);
        assert_eq!(v2.value(), 2);
        assert!(v1 < v2);
        assert_eq!(manager.last_signaled(), v2);
        assert!(!manager.is_completed(v1));

        // 模拟 GPU 完成
        manager.update_completed_value(v1);
        assert!(manager.is_completed(v1));
        assert!(!manager.is_completed(v2));

        manager.update_completed_value(v2);
        assert!(manager.is_completed(manager.last_signaled()));
    }

    #[test]
    fn test_completed_value_never_goes_back() {
        let mut manager = FenceManager::new();
        manager.next_value();
        manager.next_value();
        manager.update_completed_value(FenceValue::new(2));
        manager.update_completed_value(FenceValue::new(1));
        assert!(manager.is_completed(FenceValue::new(2)));
    }

    #[test]
    fn test_wait_only_for_unfinished_value() {
        let mut manager = FenceManager::new();
        let value = manager.next_value();

        // Signal 之后 GPU 还没追上
        manager.update_completed_value(FenceValue::new(0));
        assert!(!manager.is_completed(value));

        // 事件触发后读到的新完成值
        manager.update_completed_value(FenceValue::new(1));
        assert!(manager.is_completed(value));
    }
}
