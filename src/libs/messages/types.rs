/// Every user-facing text of the application.
#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleBackend,
    ConfigModuleAnalytics,
    BackendNotConfigured,
    PromptSelectModules,
    PromptBackendUrl,
    PromptBackendAnonKey,
    PromptTrendDays,
    PromptTrendLeadDays,

    // === ACCOUNT MESSAGES ===
    PromptEmail,
    PromptName,
    PromptPassword,
    PromptNewPassword,
    SignedUp(String),               // email
    SignUpPendingConfirmation(String), // email
    SignedIn(String),               // display name
    SignedOut,
    NotSignedIn,
    ProfileUpdated(String), // name
    PasswordUpdated,
    PasswordResetSent(String), // email
    NothingToUpdate,
    AuthFailed(String),

    // === TASK MESSAGES ===
    TaskCreated(String),   // title
    TaskUpdated(String),   // title
    TaskCompleted(String), // title
    TaskReopened(String),  // title
    TaskPinned(String),    // title
    TaskUnpinned(String),  // title
    TaskMoved(String, usize),
    BucketNotReorderable(String), // title
    TaskDeleted(String),
    TaskAlreadyDeleted(String), // id
    TaskNotFound(String),       // id or prefix
    TaskIdAmbiguous(String, usize),
    ConfirmDeleteTask(String),
    NoChangesProvided,
    InvalidDate(String),
    HomeHeader(usize, usize), // count, capacity
    BucketHeader(usize),
    NoTasks,
    TaskOperationFailed(String),

    // === WATCH MESSAGES ===
    WatchStarted,
    WatchStopped,
    WatchResynced(usize, usize), // home, bucket
    WatchReceivedCtrlC,
    WatchReceivedSigterm,
    WatchSignalListenFailed(String),

    // === ANALYTICS MESSAGES ===
    ReportHeader(String, String), // from, to
    ProductivityScore(u32, String),
    AnalyticsHeader,
    CategoriesHeader,
    TrendHeader(usize), // days
    InvalidDateRange(String, String),

    // === EXPORT MESSAGES ===
    ExportCompleted(String), // path
    ExportNoData,
    ExportFailed(String),

    // === GROUP MESSAGES ===
    GroupsHeader,
    GroupAdded(String),
    GroupRemoved(String),
}
