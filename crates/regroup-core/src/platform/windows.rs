const ERROR_HANDLE_DISK_FULL: i32 = 39;
const ERROR_DISK_FULL: i32 = 112;

pub fn is_disk_full_code(code: Option<i32>) -> bool {
    matches!(code, Some(ERROR_HANDLE_DISK_FULL) | Some(ERROR_DISK_FULL))
}
