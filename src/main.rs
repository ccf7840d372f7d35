// ==========================================
// 批量消息群发助手 - Tauri 主入口
// ==========================================
// 技术栈: Tauri + Rust + 外部发送后端
// ==========================================

// 禁止控制台窗口 (Windows)
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(feature = "tauri-app")]
fn main() {
    use bulk_messenger::app::tauri_commands::*;
    use bulk_messenger::app::AppState;
    use bulk_messenger::config::ClientConfig;

    // 初始化日志系统
    bulk_messenger::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", bulk_messenger::APP_NAME);
    tracing::info!("系统版本: {}", bulk_messenger::VERSION);
    tracing::info!("==================================================");

    let config = ClientConfig::from_env();
    tracing::info!("后端地址: {}", config.api_base);

    let app_state = AppState::new(config);

    // 启动Tauri应用
    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            // ==========================================
            // 文件导入相关命令 (2个)
            // ==========================================
            import_recipient_files,
            resolve_import_conflict,
            // ==========================================
            // 表格相关命令 (12个)
            // ==========================================
            get_table_state,
            define_headers,
            add_column,
            remove_column,
            rename_column,
            update_cell,
            add_row,
            remove_row,
            clear_table,
            set_column_binding,
            set_page,
            set_page_size,
            // ==========================================
            // 附件相关命令 (4个)
            // ==========================================
            add_attachments,
            remove_attachment,
            clear_attachments,
            list_attachments,
            // ==========================================
            // 发送配置相关命令 (4个)
            // ==========================================
            set_channel,
            set_message,
            set_sender,
            set_match_policy,
            // ==========================================
            // 发送与导出相关命令 (5个)
            // ==========================================
            preview_send,
            start_send,
            cancel_send,
            get_send_progress,
            export_table,
        ])
        .run(tauri::generate_context!())
        .expect("启动Tauri应用失败");

    tracing::info!("Tauri应用已退出");
}

#[cfg(not(feature = "tauri-app"))]
fn main() {
    println!("==================================================");
    println!("{}", bulk_messenger::APP_NAME);
    println!("系统版本: {}", bulk_messenger::VERSION);
    println!("==================================================");
    println!();
    println!("此可执行文件需要启用 tauri-app 特性");
    println!("使用: cargo run --features tauri-app");
    println!();
    println!("或者使用库模式:");
    println!("use bulk_messenger::app::SendSession;");
}
